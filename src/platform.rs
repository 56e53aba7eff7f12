mod adapters;
pub mod types;

pub use adapters::{
    AuthorizationAdapter, LocationAdapter, ReauthBlobStore, ReviewAdapter, SecureBlobStore,
    SharedAuthorization, SharedLocation, SharedReauthBlob, SharedReview, SharedSecureBlob,
};
pub use adapters::portable;
pub use types::{AskEvent, Position, PositionEvent};
