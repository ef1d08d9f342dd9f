//! sensor-dashboard binary
//!
//! One binary, two front ends over the same display board:
//! - serve: MCP server whose tools start each monitor and read the board back
//! - watch: start every monitor and repaint the board in the terminal
//!
//! Monitors: compass, accelerometer, geolocation, connection, device identity.

use clap::{Parser, Subcommand};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters, ServerHandler},
    model::*,
    ErrorData as McpError,
    ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sensor_dashboard::config;
use sensor_dashboard::sensors::latency::SystemClock;
use sensor_dashboard::shared::{internal_error, period_or};
use sensor_dashboard::sources::Sources;
use sensor_dashboard::{SensorData, Start};

// === CLI ===

#[derive(Parser)]
#[command(name = "sensor-dashboard")]
#[command(about = "Live sensor diagnostic dashboard")]
struct Cli {
    /// Use simulated sensors even when host sources are available
    #[arg(long, global = true)]
    simulated: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdio (default)
    Serve,
    /// Start every monitor and show the board in the terminal
    Watch {
        /// Compass period in milliseconds
        #[arg(long)]
        compass_ms: Option<u64>,
        /// Accelerometer period in milliseconds
        #[arg(long)]
        acc_ms: Option<u64>,
        /// Connection poll interval in milliseconds
        #[arg(long)]
        connection_ms: Option<u64>,
    },
    /// Open the config file in your editor
    Config,
}

// === Parameter Types ===

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EmptyParams {}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FrequencyParams {
    #[schemars(description = "Reading period in milliseconds (optional - uses the configured default)")]
    #[serde(default)]
    pub frequency_ms: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IntervalParams {
    #[schemars(description = "Poll interval in milliseconds (optional - uses the configured default)")]
    #[serde(default)]
    pub interval_ms: Option<u64>,
}

fn started_text(what: &str, outcome: Start, period_ms: Option<u64>) -> String {
    match (outcome, period_ms) {
        (Start::Started, Some(ms)) => format!("{} started (every {} ms)", what, ms),
        (Start::Started, None) => format!("{} started", what),
        (Start::AlreadyActive, _) => format!("{} already running", what),
    }
}

// === Server ===

pub struct DashboardServer {
    pub tool_router: ToolRouter<Self>,
    sensors: Arc<SensorData>,
    config: config::Config,
}

impl DashboardServer {
    pub fn new(sensors: Arc<SensorData>, config: config::Config) -> Self {
        let mut tool_router = Self::tool_router();

        for tool_name in &config.disabled {
            if !config::all_tool_names().contains(&tool_name.as_str()) {
                tracing::warn!("Config disables unknown tool: {}", tool_name);
            }
        }

        let mut disabled_count = 0;
        for tool_name in config::all_tool_names() {
            if !config.is_enabled(tool_name) && tool_router.has_route(tool_name) {
                tool_router.remove_route(tool_name);
                tracing::info!("Disabled tool: {}", tool_name);
                disabled_count += 1;
            }
        }

        if disabled_count > 0 {
            tracing::info!(
                "Loaded config: {} tools disabled, {} tools active",
                disabled_count,
                tool_router.map.len()
            );
        }

        Self {
            tool_router,
            sensors,
            config,
        }
    }
}

#[rmcp::tool_router]
impl DashboardServer {
    #[rmcp::tool(description = "Start the compass watch: magnetic heading, true heading, accuracy and time between readings. Starting it twice raises an alert.")]
    pub async fn init_compass(
        &self,
        Parameters(params): Parameters<FrequencyParams>,
    ) -> Result<CallToolResult, McpError> {
        let ms = period_or(params.frequency_ms, self.config.compass_frequency_ms);
        let outcome = self
            .sensors
            .init_compass(Some(ms))
            .map_err(|e| internal_error(format!("Failed to start compass: {}", e)))?;
        Ok(CallToolResult::success(vec![Content::text(started_text(
            "Compass watch",
            outcome,
            Some(ms),
        ))]))
    }

    #[rmcp::tool(description = "Start the accelerometer watch: x, y, z acceleration and time between readings")]
    pub async fn init_acc(
        &self,
        Parameters(params): Parameters<FrequencyParams>,
    ) -> Result<CallToolResult, McpError> {
        let ms = period_or(params.frequency_ms, self.config.accelerometer_frequency_ms);
        let outcome = self
            .sensors
            .init_acc(Some(ms))
            .map_err(|e| internal_error(format!("Failed to start accelerometer: {}", e)))?;
        Ok(CallToolResult::success(vec![Content::text(started_text(
            "Accelerometer watch",
            outcome,
            Some(ms),
        ))]))
    }

    #[rmcp::tool(description = "Start the geolocation watch: coordinates, altitude, accuracy, heading, speed and time between fixes")]
    pub async fn init_geo(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .sensors
            .init_geo()
            .map_err(|e| internal_error(format!("Failed to start geolocation: {}", e)))?;
        Ok(CallToolResult::success(vec![Content::text(started_text(
            "Geolocation watch",
            outcome,
            None,
        ))]))
    }

    #[rmcp::tool(description = "Start polling the network connection type and the time between checks")]
    pub async fn init_check_connection(
        &self,
        Parameters(params): Parameters<IntervalParams>,
    ) -> Result<CallToolResult, McpError> {
        let ms = period_or(params.interval_ms, self.config.connection_interval_ms);
        let outcome = self.sensors.init_check_connection(Some(ms));
        Ok(CallToolResult::success(vec![Content::text(started_text(
            "Connection check",
            outcome,
            Some(ms),
        ))]))
    }

    #[rmcp::tool(description = "Show device identity: name, runtime version, platform, uuid, OS version, model")]
    pub async fn init_device(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        self.sensors
            .init_device()
            .map_err(|e| internal_error(format!("Failed to read device info: {}", e)))?;
        Ok(CallToolResult::success(vec![Content::text("Device info shown")]))
    }

    #[rmcp::tool(description = "Read every display slot, raised alerts and which monitors are running")]
    pub async fn get_display(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        let snapshot = self.sensors.board().snapshot();
        let json = serde_json::json!({
            "slots": snapshot.slots,
            "alerts": snapshot.alerts,
            "active": self.sensors.activity(),
        });
        let text = serde_json::to_string_pretty(&json)
            .map_err(|e| internal_error(format!("Serialization error: {}", e)))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[rmcp::tool_handler]
impl ServerHandler for DashboardServer {
    fn get_info(&self) -> ServerInfo {
        let description = String::from(
            "sensor-dashboard: live device sensor readings.\n\
             - init_compass, init_acc, init_geo, init_check_connection, init_device start the monitors\n\
             - get_display reads the board\n",
        );

        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(description),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config) => {
            run_config_command()?;
        }
        Some(Commands::Watch {
            compass_ms,
            acc_ms,
            connection_ms,
        }) => {
            init_tracing("warn");
            let mut config = config::Config::load();
            config.compass_frequency_ms = compass_ms.unwrap_or(config.compass_frequency_ms);
            config.accelerometer_frequency_ms = acc_ms.unwrap_or(config.accelerometer_frequency_ms);
            config.connection_interval_ms = connection_ms.unwrap_or(config.connection_interval_ms);
            run_watch(config, cli.simulated).await?;
        }
        Some(Commands::Serve) | None => {
            init_tracing("info");
            run_server(cli.simulated).await?;
        }
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_sensors(simulated: bool) -> SensorData {
    let clock = Arc::new(SystemClock);
    SensorData::new(Sources::detect(clock.clone(), simulated), clock)
}

/// Open config file in user's editor
fn run_config_command() -> anyhow::Result<()> {
    let config_path = config::Config::path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    // Create config dir if needed
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Create config file from template if it doesn't exist
    if !config_path.exists() {
        let template = include_str!("../dashboard.toml.example");
        std::fs::write(&config_path, template)?;
        println!("Created config file: {}", config_path.display());
    }

    println!("Available tools: {}", config::all_tool_names().join(", "));

    // Get editor from environment or use defaults
    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            #[cfg(target_os = "windows")]
            { "notepad".to_string() }
            #[cfg(not(target_os = "windows"))]
            { "nano".to_string() }
        });

    println!("Opening {} with {}", config_path.display(), editor);

    // Open editor
    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()?;

    Ok(())
}

/// Start every monitor and repaint the board until Ctrl-C
async fn run_watch(config: config::Config, simulated: bool) -> anyhow::Result<()> {
    let sensors = build_sensors(simulated);
    let failed = sensors.init_all(&config);
    if failed > 0 {
        tracing::warn!("{} monitors failed to start", failed);
    }

    let mut refresh = tokio::time::interval(Duration::from_millis(period_or(Some(config.refresh_ms), 500)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                let mut stdout = std::io::stdout().lock();
                // Clear screen, cursor home
                write!(stdout, "\x1B[2J\x1B[H{}", sensors.board().render())?;
                stdout.flush()?;
            }
            result = &mut shutdown => {
                result?;
                break;
            }
        }
    }

    sensors.shutdown();
    Ok(())
}

/// Run the MCP server
async fn run_server(simulated: bool) -> anyhow::Result<()> {
    tracing::info!("Starting sensor-dashboard server");

    let config = config::Config::load();
    let sensors = Arc::new(build_sensors(simulated));

    if config.autostart {
        let failed = sensors.init_all(&config);
        tracing::info!("Autostarted monitors ({} failed)", failed);
    }

    let server = DashboardServer::new(Arc::clone(&sensors), config);
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;

    sensors.shutdown();
    tracing::info!("sensor-dashboard server stopped");
    Ok(())
}
