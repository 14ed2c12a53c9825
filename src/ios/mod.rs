//! iOS platform edits.
mod entitlements;
mod rename;
mod url_schemes;
mod xcode;

pub use entitlements::generate_associated_domains_entitlements;
pub use rename::{find_project_name, plan_rename};
pub use url_schemes::register_url_schemes;
pub use xcode::enable_associated_domains_capability;
