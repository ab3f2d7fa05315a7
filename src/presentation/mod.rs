mod builder;
mod claims;
mod transforms;

pub use builder::{load_templates, PresentationBuilder};
pub use claims::{ClaimsError, ClaimsExtractor, SdJwtShapedParser, VpTokenParser};
pub use transforms::{TransformError, TransformRegistry};
