pub mod reconciler;
pub mod session;
pub mod sub_path;
pub mod teardown;

pub use reconciler::{ReconcileReport, SessionReconciler};
pub use session::{StartedStream, StreamSessionService};
pub use sub_path::{IdentitySubPath, SubPathResolver};
pub use teardown::teardown;
