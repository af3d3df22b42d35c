/// Networking: TCP port allocation, UDP discovery wire types and the
/// broadcaster that periodically emits them.
pub mod broadcaster;
pub mod discovery;
pub mod port_allocator;
