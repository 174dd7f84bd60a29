/// Connection lifecycle state (spec §3, §4.8). Transitions are serialized
/// by the client under a mutex; this type only names the states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}
