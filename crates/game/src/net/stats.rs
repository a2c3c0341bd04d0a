#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// Sends skipped because the transport was not ready.
    pub sends_deferred: u64,
}

impl NetworkStats {
    pub fn merge(&mut self, other: &NetworkStats) {
        self.frames_sent += other.frames_sent;
        self.frames_received += other.frames_received;
        self.bytes_sent += other.bytes_sent;
        self.bytes_received += other.bytes_received;
        self.sends_deferred += other.sends_deferred;
    }
}
