//! Server election strategies

use dcsim_core::Server;

/// Strategy for choosing the server a job is dispatched to
pub trait ElectionStrategy {
    /// Index of the elected server, `None` when no server can take a job
    fn elect(&self, servers: &[Server]) -> Option<usize>;
}

/// First idle server in fixed order
pub struct FirstAvailable;

impl ElectionStrategy for FirstAvailable {
    fn elect(&self, servers: &[Server]) -> Option<usize> {
        servers.iter().position(Server::is_idle)
    }
}

/// Idle server with the highest `performance * max(frequencies)`.
///
/// Ties go to the lowest index. Servers with no capacity are never elected.
pub struct MostPowerfulAvailable;

impl ElectionStrategy for MostPowerfulAvailable {
    fn elect(&self, servers: &[Server]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (index, server) in servers.iter().enumerate() {
            let capacity = server.capacity();
            if !server.is_idle() || capacity <= 0.0 {
                continue;
            }
            match best {
                Some((_, top)) if capacity <= top => {}
                _ => best = Some((index, capacity)),
            }
        }

        best.map(|(index, _)| index)
    }
}
