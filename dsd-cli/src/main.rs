mod cli;
mod config;
mod logging;
mod presets;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{eyre, Context, Result};

use cli::Cli;
use config::CliConfig;
use dsd_core::control::{CasLock, UdpControlListener, Watchdog};
use dsd_core::context::DecoderContext;
use dsd_core::crypto::{parse_hex_key, KeySource};
use dsd_core::trunk_sm::Action;
use dsd_core::tuning::{NoDirectStream, RigctlClient, RtlUdpTuner, TuningDispatcher};
use dsd_core::runtime;
use logging::StructuredLogger;

fn main() -> Result<()> {
    color_eyre::install()?;
    let raw_args: Vec<String> = std::env::args().collect();
    let cli = Cli::parse_from(cli::preprocess_preset_flags(raw_args));

    let mut config = match cli.config_path() {
        Some(path) => {
            CliConfig::from_file(path).wrap_err_with(|| format!("failed to load config from {}", path.display()))?
        }
        None => CliConfig::default(),
    };

    apply_cli_overrides(&mut config, &cli)?;

    let mut log_config = config.logging.clone();
    if let Some(format) = &cli.log_format {
        log_config.format = match format.as_str() {
            "json" => logging::LogFormat::Json,
            "logfmt" => logging::LogFormat::Logfmt,
            _ => logging::LogFormat::Pretty,
        };
    }
    if cli.verbose > 0 {
        log_config.level = logging::LogLevel::Debug;
    }
    StructuredLogger::install(log_config)?;

    run(config)
}

/// Apply `-i`/`-w`/`-r`/preset/key/rdio/RTL-UDP-control CLI flags on top of
/// whatever the config file already set; CLI flags win.
fn apply_cli_overrides(config: &mut CliConfig, cli: &Cli) -> Result<()> {
    if let Some(input) = &cli.input {
        config.input.spec = Some(input.clone());
    }
    if let Some(wav) = &cli.wav_output {
        config.output.wav_path = Some(wav.clone());
    }
    if let Some(mbe) = &cli.mbe_input {
        config.input.mbe_in_path = Some(mbe.clone());
    }
    if let Some(decode) = cli.protocol_preset() {
        config.mode.decode = decode;
    }
    if let Some(port) = cli.rtl_udp_control {
        config.rtl_udp_control_port = Some(port);
    }
    config.output.rdio_mode = match cli.rdio_mode {
        cli::RdioModeArg::Off => config.output.rdio_mode,
        cli::RdioModeArg::Dirwatch => config::RdioMode::Dirwatch,
        cli::RdioModeArg::Api => config::RdioMode::Api,
        cli::RdioModeArg::Both => config::RdioMode::Both,
    };
    if let Some(url) = &cli.rdio_api_url {
        config.output.rdio_api_url = Some(url.clone());
    }
    if let Some(key) = &cli.rdio_api_key {
        config.output.rdio_api_key = Some(key.clone());
    }

    // Validate key material eagerly so a malformed `-H`/`-1` argument is an
    // exit-code-1 config error rather than a silent no-op later. Handing
    // the resolved KeySource to a live Keystream provider is a per-protocol
    // decoder concern outside this crate.
    if let Some(hex) = &cli.aes_key {
        let bytes = parse_hex_key(hex).map_err(|e| eyre!("invalid -H key: {e}"))?;
        let _: KeySource = KeySource::Aes256(bytes);
    }
    if let Some(hex) = &cli.rc4_key {
        let bytes = parse_hex_key(hex).map_err(|e| eyre!("invalid -1 key: {e}"))?;
        let _: KeySource = KeySource::Rc4(bytes);
    }

    Ok(())
}

/// Wire the decoder context, tuning dispatcher, UDP control listener, and
/// SM watchdog together and run until shutdown is requested.
fn run(config: CliConfig) -> Result<()> {
    log::info!(target: "dsd_cli", "starting with decode mode {:?}, input {:?}", config.mode.decode, config.input.spec);

    let trunk_policy = dsd_core::trunk_sm::policy::Policy {
        tune_data_calls: config.trunking.tune_data_calls,
        tune_enc_calls: config.trunking.tune_enc_calls,
        ..Default::default()
    };
    let initial_cc_hz: i64 = 0;
    let context = Arc::new(Mutex::new(DecoderContext::new(
        config.trunking.clone(),
        trunk_policy,
        config.output.tuning.clone(),
        initial_cc_hz,
    )));

    let rigctl = Some(RigctlClient::new(
        config.output.tuning.rigctl_host.clone(),
        config.output.tuning.rigctl_port,
        config.output.tuning.rigctl_timeout_ms,
    ));
    let rtl_udp = config
        .output
        .tuning
        .rtl_udp_port
        .map(RtlUdpTuner::new)
        .transpose()
        .wrap_err("failed to bind RTL-UDP tuner socket")?;
    let dispatcher = Arc::new(Mutex::new(TuningDispatcher::new(NoDirectStream, rigctl, rtl_udp)));

    let stop_flag = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::new();

    if let Some(port) = config.rtl_udp_control_port {
        let listener = UdpControlListener::bind(port, stop_flag.clone())
            .wrap_err_with(|| format!("failed to bind UDP control listener on port {port}"))?;
        log::info!(target: "dsd_cli", "UDP control listener bound on port {port}");
        let dispatcher_for_listener = dispatcher.clone();
        handles.push(std::thread::spawn(move || {
            listener.serve(|freq_hz| {
                log::debug!(target: "dsd_cli", "UDP control: retune to {freq_hz} Hz");
                if let Ok(mut d) = dispatcher_for_listener.lock() {
                    if let Err(e) = d.tune_to_freq(freq_hz) {
                        log::warn!(target: "dsd_cli", "UDP-triggered retune failed: {e}");
                    }
                }
            });
        }));
    }

    let watchdog_period_ms = config.trunking.watchdog_period_ms(true);
    let cas_lock = Arc::new(CasLock::new());
    let watchdog = Watchdog::new(watchdog_period_ms, stop_flag.clone(), cas_lock);
    let context_for_watchdog = context.clone();
    let dispatcher_for_watchdog = dispatcher.clone();
    handles.push(std::thread::spawn(move || {
        watchdog.run(|| {
            let now = Instant::now();
            let actions = {
                let Ok(mut ctx) = context_for_watchdog.lock() else { return };
                let event = dsd_core::trunk_sm::Event::Tick;
                let DecoderContext { trunk_sm: sm, iden_table, cc_candidates, jitter_rings, .. } = &mut *ctx;
                let actions = sm.handle(event, &*iden_table, cc_candidates, now);
                for action in &actions {
                    if let Action::SetAudioGate { slot, allowed } = action {
                        jitter_rings.gate.set(*slot as usize, *allowed);
                    }
                }
                actions
            };

            for action in actions {
                apply_tune_action(action, &dispatcher_for_watchdog, &context_for_watchdog, now);
            }
        });
    }));

    // Sample-source ingestion, demodulation, and protocol decode run behind
    // the sample_source/speech/fec/crypto trait boundaries; wiring a real
    // backend in is outside this crate. Idle until shutdown is requested.
    // `runtime::request_shutdown` is the process-wide, signal-handler-safe
    // way to stop this loop; nothing in this binary installs a signal
    // handler itself (that belongs to whichever UI layer owns the process).
    while !runtime::should_shutdown() && !stop_flag.load(Ordering::Relaxed) {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    stop_flag.store(true, Ordering::SeqCst);

    for handle in handles {
        let _ = handle.join();
    }

    Ok(())
}

/// Apply one Trunk-SM tuning action to the shared dispatcher. `SetAudioGate`
/// is handled by the caller directly against `jitter_rings.gate` while the
/// context lock is still held; this only drives the control plane.
fn apply_tune_action(
    action: Action,
    dispatcher: &Arc<Mutex<TuningDispatcher<NoDirectStream>>>,
    context: &Arc<Mutex<DecoderContext>>,
    now: Instant,
) {
    let (freq_hz, is_cc) = match action {
        Action::TuneVc { freq_hz, .. } => (freq_hz, false),
        Action::TuneCc { freq_hz } => (freq_hz, true),
        Action::Release | Action::SetAudioGate { .. } => return,
    };

    let Ok(mut dispatcher) = dispatcher.lock() else { return };
    let result = if is_cc {
        dispatcher.tune_to_cc(freq_hz as u64)
    } else {
        dispatcher.tune_to_freq(freq_hz as u64)
    };
    drop(dispatcher);

    if let Err(e) = result {
        log::warn!(target: "dsd_cli", "retune to {freq_hz} Hz failed: {e}");
        if let Ok(mut ctx) = context.lock() {
            let DecoderContext { trunk_sm, cc_candidates, .. } = &mut *ctx;
            trunk_sm.handle_tune_failure(freq_hz, cc_candidates, now);
        }
    }
}
