//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_company_list_repository;
mod postgres_company_list_repository;

pub use in_memory_company_list_repository::InMemoryCompanyListRepository;
pub use postgres_company_list_repository::PostgresCompanyListRepository;
