pub mod applier;
pub mod local_signer;
pub mod object;
pub mod signer;

pub use applier::{ApplyResult, Origin, VertexApplier};
pub use local_signer::LocalSigner;
pub use object::Object;
pub use signer::Signer;
