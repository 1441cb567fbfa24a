/// Router Module Index
///
/// Routes are split by access level. The public table needs no token; every entry of the
/// protected table pairs a method router with exactly one required permission, and the
/// permission gate runs before the handler is dispatched.

/// Routes open to anonymous clients.
pub mod public;

/// Routes guarded by a bearer token carrying a specific permission.
pub mod protected;
