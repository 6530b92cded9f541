use color_eyre::{eyre::eyre, Result};
use headsteer::attitude::IdleAttitude;
use headsteer::camera::{DepthCamera, ReplaySource};
use headsteer::config::Settings;
use headsteer::pipeline::SteeringLoop;
use headsteer::report::ReportHandle;
use headsteer::serial::{open_port, FramedTransmitter, TransmitterHandle};
use headsteer::steering::Morphology;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

// First argument that turns on the report echo
const VERBOSE_FLAG: &str = "-v";

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let verbose = std::env::args().nth(1).as_deref() == Some(VERBOSE_FLAG);
    let settings = Settings::load()?;
    info!("Loaded settings: {:?}", settings);

    let report = ReportHandle::new(settings.transmitter.signature);
    let cancel = CancellationToken::new();

    let port = open_port(&settings.transmitter)?;

    let source = Box::new(ReplaySource::new(&settings.camera));
    let (camera, masks) = DepthCamera::create(source, settings.filter.clone());
    let camera = camera
        .start()
        .map_err(|e| eyre!("Failed to start depth camera: {}", e))?;

    // Both devices are up, start the loops
    let transmitter = TransmitterHandle::spawn(
        FramedTransmitter::new(port, report.subscribe(), &settings.transmitter),
        cancel.clone(),
    );

    let steering = SteeringLoop::new(
        masks,
        Box::new(Morphology::new()),
        Box::new(IdleAttitude),
        report,
        &settings.estimator,
        &settings.pipeline,
    )
    .with_verbose(verbose);
    let steering = tokio::spawn(steering.run(cancel.clone()));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, shutting down"),
            Err(e) => error!("Unable to listen for interrupt: {}", e),
        }
        shutdown.cancel();
    });

    cancel.cancelled().await;
    if let Err(e) = steering.await {
        error!("Steering loop task failed: {}", e);
    }
    let stats = transmitter.join().await;
    info!(
        "Transmitter finished: {} frames, {} write failures",
        stats.frames_sent, stats.write_failures
    );
    camera.stop();

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
