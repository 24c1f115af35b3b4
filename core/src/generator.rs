//! Synthetic activity logs for demos and tests.
//!
//! Each account draws from its own `EventRng` stream, so a given
//! (seed, config) pair always yields the same log in the same order.

use crate::{
    config::GeneratorConfig,
    event::ActivityEvent,
    month::CalendarMonth,
    rng::EventRng,
};
use chrono::Datelike;

pub fn generate_events(config: &GeneratorConfig, seed: u64) -> Vec<ActivityEvent> {
    let months: Vec<CalendarMonth> =
        std::iter::successors(Some(config.start_month), |m| Some(m.succ()))
            .take(config.months as usize)
            .collect();

    let mut events = Vec::new();
    for account_idx in 0..config.accounts {
        let mut rng = EventRng::for_stream(seed, account_idx as u64);
        let account_id = format!("acct-{:03}", account_idx + 1);

        for user_idx in 0..config.users_per_account {
            let user_id = format!("user-{:04}", user_idx + 1);
            for month in &months {
                if !rng.chance(config.activity_probability) {
                    continue;
                }
                let days = month.last_day().day() as u64;
                for _ in 0..config.events_per_user_month.max(1) {
                    let day = 1 + rng.next_u64_below(days) as u32;
                    let Some(date) = month.first_day().with_day(day) else {
                        continue;
                    };
                    events.push(ActivityEvent::new(account_id.clone(), user_id.clone(), date));
                }
            }
        }
    }

    log::info!(
        "generator: seed={seed} accounts={} months={} events={}",
        config.accounts,
        months.len(),
        events.len()
    );
    events
}
