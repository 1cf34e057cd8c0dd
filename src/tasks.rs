use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::sync::Arc;
use std::time::Duration;

use crate::session::{SessionStore, SESSION_IDLE};

/// How often idle sessions are swept.
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(30 * 60);

pub struct BackgroundTasks;

#[rocket::async_trait]
impl Fairing for BackgroundTasks {
    fn info(&self) -> Info {
        Info {
            name: "Background Tasks",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let sessions = match rocket.state::<Arc<SessionStore>>() {
            Some(s) => Arc::clone(s),
            None => {
                log::error!("[task] Session store not managed, cleanup disabled");
                return;
            }
        };

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(SESSION_CLEANUP_INTERVAL).await;
                let before = sessions.len();
                sessions.cleanup(SESSION_IDLE);
                let removed = before.saturating_sub(sessions.len());
                if removed > 0 {
                    log::info!("[task] Cleaned up {} idle sessions", removed);
                }
            }
        });
    }
}
