//! Background scheduled tasks for the application.
//!
//! The only recurring job is the batch ticket-restoration sweep: the same
//! depletion-timer rules the lazy read path applies, run periodically so
//! inactive users get their ticket back without opening the app.
//! Call `spawn_all` once during startup to launch it.

use crate::services::TicketService;

/// Spawn all background tasks.
///
/// Notes
/// - The sweep is idempotent: each pass settles users whose timer expired
///   and leaves everyone else untouched.
/// - This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(ticket_service: TicketService) {
    // 每小时批量恢复已到期的枯竭用户
    {
        let svc = ticket_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.restore_depleted_batch().await {
                    Ok(n) if n > 0 => log::info!("Restored tickets for {n} depleted users"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to run restoration sweep: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            }
        });
    }
}
