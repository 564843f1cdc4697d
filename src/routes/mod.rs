/// Router Module Index
///
/// Routes are split by the authentication they require. Role checks are never
/// done here: every handler consults `permissions` for the specific resource.

/// Routes open to anonymous visitors. Handlers that render viewer-dependent
/// output resolve an optional identity.
pub mod public;

/// Routes behind the `AuthUser` extractor middleware.
pub mod authenticated;

/// Administration routes, nested under `/admin`. Also authenticated; the admin
/// role is checked per action by the handlers.
pub mod admin;
