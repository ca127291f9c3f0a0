use anyhow::Context;
use libris_kernel::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load libris settings")?;
    libris_telemetry::init(&settings.telemetry);
    settings.validate()?;

    libris::app::serve(settings).await
}
