use crate::simulator::MarketSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum WsConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting { attempt: u32, delay_ms: u64 },
}

/// Messages from background feed tasks to the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Fresh reference quote for the simulator and quote bar.
    Market(MarketSnapshot),
    /// Every configured provider failed this round.
    ProvidersUnavailable(String),
    WsStatus(WsConnectionStatus),
    TickDropped,
    LogMessage(String),
}
