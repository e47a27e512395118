use fee_reminder_api::{Application, Scheduler};
use fee_reminder_infra::{InMemoryNotifier, ReminderContext, StaticTimeSys};
use std::sync::Arc;

pub struct TestApp {
    pub ctx: ReminderContext,
    pub notifier: Arc<InMemoryNotifier>,
    pub scheduler: Scheduler,
    pub address: String,
}

// Launch the application as a background task with its clock fixed at `now`
pub async fn spawn_app(now: i64) -> TestApp {
    let mut ctx = ReminderContext::create_inmemory();
    ctx.config.port = 0; // Random port
    ctx.sys = Arc::new(StaticTimeSys::new(now));
    let notifier = Arc::new(InMemoryNotifier::new());
    ctx.notifier = notifier.clone();

    let application = Application::new(ctx.clone())
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}/api/v1", application.port());
    let scheduler = application.scheduler();
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    TestApp {
        ctx,
        notifier,
        scheduler,
        address,
    }
}
