mod error;
mod handlers;
mod validation;

pub use error::RegistrationError;
pub use handlers::{delete_client, get_client, register, update_client};
pub use validation::ClientMetadataInput;
