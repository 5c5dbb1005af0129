//! Demonstration method handlers for the callwire JSON-RPC server.
//!
//! Four small services in the action-oriented style: tax calculation,
//! arithmetic, in-memory user CRUD, and system utilities. Each service is a
//! single [`RpcMethod`](callwire_json_rpc::RpcMethod) handler serving several
//! method names.

pub mod calc;
pub mod system;
pub mod tax;
pub mod users;

pub use calc::CalculationService;
pub use system::SystemService;
pub use tax::TaxService;
pub use users::{User, UserError, UserPatch, UserService, UserStore};

use callwire_json_rpc::MethodRegistry;

/// Build a registry with the full demo method set.
pub fn registry() -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry.register_service(TaxService);
    registry.register_service(UserService::new());
    registry.register_service(CalculationService);

    // The system service reports every registered method, including its own.
    let mut methods = registry.method_names();
    methods.extend(SystemService::method_set().iter().map(|s| s.to_string()));
    methods.sort();
    registry.register_service(SystemService::new(methods));

    registry
}
