// Filesystem bindings: capability probing and validated dispatch to the
// platform's maintenance utilities (f2fs-tools, udftools, util-linux).
pub mod availability;
pub mod capability;
pub mod families;
pub mod ops;
pub mod probe;
pub mod registry;
pub mod wipe;

pub use availability::{ensure_available, ensure_tool_version, is_available};
pub use capability::{CapabilityMode, FilesystemType};
pub use families::f2fs::{F2fsFeature, F2fsInfo};
pub use families::udf::{UdfInfo, UdfMkfsOptions};
pub use ops::FsInfo;
pub use probe::get_fstype;
pub use registry::{requirements_for, supported_capabilities, ToolRequirement};
