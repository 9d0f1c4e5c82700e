// PostgreSQL implementations of the store traits

pub mod job;
pub mod run;
pub mod template;

pub use job::JobRepository;
pub use run::RunRepository;
pub use template::TemplateRepository;
