pub mod email_discovery;
pub mod email_verify;
pub mod registry;
pub mod tax_id;
pub mod tech_stack;

pub use email_discovery::EmailFinder;
pub use email_verify::EmailVerifier;
pub use registry::RegistryClient;
pub use tax_id::TaxIdExtractor;
pub use tech_stack::detect_tech_stack;
