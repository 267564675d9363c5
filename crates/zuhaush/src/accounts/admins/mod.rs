//! Console administrators and their navigation permissions.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{Admin, AdminId, AdminPermission, AdminPermissions, AdminRole};
pub use repository::AdminRepository;
pub use router::admin_router;
pub use service::{AdminService, AdminSession, AdminStats, AdminUpdate, NewAdmin};
