use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::{PI, TAU};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Audio features for one tick. Captured once before any act update and shared by reference.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioFeatureSnapshot {
    pub volume: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub beat: bool,
}

impl AudioFeatureSnapshot {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn clamped(self) -> Self {
        Self {
            volume: clamp01(self.volume),
            bass: clamp01(self.bass),
            mid: clamp01(self.mid),
            treble: clamp01(self.treble),
            beat: self.beat,
        }
    }
}

/// Per-tick audio analysis source. `update` advances analysis by one tick; the getters read the
/// result of the most recent `update`.
pub trait AudioFeatureStream {
    fn update(&mut self);
    fn volume(&self) -> f32;
    fn bass(&self) -> f32;
    fn mid(&self) -> f32;
    fn treble(&self) -> f32;
    fn beat(&self) -> bool;

    fn snapshot(&self) -> AudioFeatureSnapshot {
        AudioFeatureSnapshot {
            volume: self.volume(),
            bass: self.bass(),
            mid: self.mid(),
            treble: self.treble(),
            beat: self.beat(),
        }
        .clamped()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioFeatureStream for SilentAudio {
    fn update(&mut self) {}
    fn volume(&self) -> f32 {
        0.0
    }
    fn bass(&self) -> f32 {
        0.0
    }
    fn mid(&self) -> f32 {
        0.0
    }
    fn treble(&self) -> f32 {
        0.0
    }
    fn beat(&self) -> bool {
        false
    }
}

/// Deterministic tempo-locked generator used by the headless host, the benchmark and tests.
pub struct SyntheticAudio {
    bpm: f32,
    tick_secs: f32,
    t: f32,
    rng: fastrand::Rng,
    current: AudioFeatureSnapshot,
}

impl SyntheticAudio {
    pub fn new(bpm: f32, tick_hz: u32, seed: u64) -> Self {
        Self {
            bpm: bpm.clamp(30.0, 300.0),
            tick_secs: 1.0 / tick_hz.max(1) as f32,
            t: 0.0,
            rng: fastrand::Rng::with_seed(seed),
            current: AudioFeatureSnapshot::default(),
        }
    }

    pub fn beat_period_secs(&self) -> f32 {
        60.0 / self.bpm
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.t
    }
}

impl AudioFeatureStream for SyntheticAudio {
    fn update(&mut self) {
        let period = self.beat_period_secs();
        let prev_beat = (self.t / period).floor();
        self.t += self.tick_secs;
        let beat_idx = (self.t / period).floor();
        let beat = beat_idx > prev_beat;

        // Kick envelope decays within the beat; mids sway slowly; hats are noisy.
        let phase = (self.t / period).fract();
        let kick = (-phase * 7.0).exp();
        let bass = 0.18 + 0.72 * kick;
        let mid = 0.35 + 0.25 * (self.t * TAU * 0.23).sin();
        let hat = if (phase * 4.0).fract() < 0.12 { 0.45 } else { 0.1 };
        let treble = hat + self.rng.f32() * 0.2;
        let volume = bass * 0.5 + mid * 0.3 + treble * 0.2;

        self.current = AudioFeatureSnapshot {
            volume,
            bass,
            mid,
            treble,
            beat,
        }
        .clamped();
    }

    fn volume(&self) -> f32 {
        self.current.volume
    }
    fn bass(&self) -> f32 {
        self.current.bass
    }
    fn mid(&self) -> f32 {
        self.current.mid
    }
    fn treble(&self) -> f32 {
        self.current.treble
    }
    fn beat(&self) -> bool {
        self.current.beat
    }
}

/// Sequence-locked cell the analysis thread publishes into and the tick thread reads from.
pub struct AtomicAudioFeatures {
    seq: AtomicU64,
    volume: AtomicU32,
    bass: AtomicU32,
    mid: AtomicU32,
    treble: AtomicU32,
    beat: AtomicU32,
}

impl AtomicAudioFeatures {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            volume: AtomicU32::new(0),
            bass: AtomicU32::new(0),
            mid: AtomicU32::new(0),
            treble: AtomicU32::new(0),
            beat: AtomicU32::new(0),
        }
    }

    pub fn store(&self, f: AudioFeatureSnapshot) {
        self.seq.fetch_add(1, Ordering::Release); // odd => write in progress
        self.volume.store(f.volume.to_bits(), Ordering::Relaxed);
        self.bass.store(f.bass.to_bits(), Ordering::Relaxed);
        self.mid.store(f.mid.to_bits(), Ordering::Relaxed);
        self.treble.store(f.treble.to_bits(), Ordering::Relaxed);
        // Beats latch until the tick thread consumes them.
        if f.beat {
            self.beat.store(1, Ordering::Relaxed);
        }
        self.seq.fetch_add(1, Ordering::Release); // even => stable
    }

    /// Reads a consistent snapshot and clears the latched beat flag.
    pub fn take(&self) -> AudioFeatureSnapshot {
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }
            let volume = f32::from_bits(self.volume.load(Ordering::Relaxed));
            let bass = f32::from_bits(self.bass.load(Ordering::Relaxed));
            let mid = f32::from_bits(self.mid.load(Ordering::Relaxed));
            let treble = f32::from_bits(self.treble.load(Ordering::Relaxed));
            let v2 = self.seq.load(Ordering::Acquire);
            if v1 == v2 {
                let beat = self.beat.swap(0, Ordering::Relaxed) != 0;
                return AudioFeatureSnapshot {
                    volume,
                    bass,
                    mid,
                    treble,
                    beat,
                };
            }
        }
    }
}

impl Default for AtomicAudioFeatures {
    fn default() -> Self {
        Self::new()
    }
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

/// Microphone capture analysed on a background thread.
pub struct LiveAudio {
    _stream: cpal::Stream,
    stop: Arc<AtomicBool>,
    analyzer_handle: Option<thread::JoinHandle<()>>,
    features: Arc<AtomicAudioFeatures>,
    current: AudioFeatureSnapshot,
    pub sample_rate_hz: u32,
}

impl LiveAudio {
    pub fn new(device_query: Option<&str>) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = select_input_device(&host, device_query)?;
        let supported = device
            .default_input_config()
            .context("get default input config")?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        let rb = HeapRb::<f32>::new((sample_rate_hz as usize).saturating_mul(4));
        let (mut prod, mut cons) = rb.split();

        let stop = Arc::new(AtomicBool::new(false));
        let features = Arc::new(AtomicAudioFeatures::new());
        let features_for_thread = Arc::clone(&features);
        let stop_for_thread = Arc::clone(&stop);

        let err_fn = |err| log::error!("audio stream error: {err}");

        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            fmt => return Err(anyhow!("unsupported sample format: {fmt:?}")),
        };
        stream.play().context("start input stream")?;
        log::info!("capturing audio at {sample_rate_hz} Hz ({channels} ch)");

        let analyzer_handle = thread::spawn(move || {
            analyze_loop(&mut cons, sample_rate_hz, &stop_for_thread, &features_for_thread)
        });

        Ok(Self {
            _stream: stream,
            stop,
            analyzer_handle: Some(analyzer_handle),
            features,
            current: AudioFeatureSnapshot::default(),
            sample_rate_hz,
        })
    }
}

impl AudioFeatureStream for LiveAudio {
    fn update(&mut self) {
        self.current = self.features.take().clamped();
    }
    fn volume(&self) -> f32 {
        self.current.volume
    }
    fn bass(&self) -> f32 {
        self.current.bass
    }
    fn mid(&self) -> f32 {
        self.current.mid
    }
    fn treble(&self) -> f32 {
        self.current.treble
    }
    fn beat(&self) -> bool {
        self.current.beat
    }
}

impl Drop for LiveAudio {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.analyzer_handle.take() {
            let _ = h.join();
        }
    }
}

fn select_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> anyhow::Result<cpal::Device> {
    let devices = host
        .input_devices()
        .context("enumerate input devices")?
        .collect::<Vec<_>>();

    if let Some(want) = device_query.map(str::to_lowercase) {
        return devices
            .iter()
            .find(|d| {
                d.name()
                    .map(|n| n.to_lowercase().contains(&want))
                    .unwrap_or(false)
            })
            .cloned()
            .ok_or_else(|| anyhow!("no input device matching: {want}"));
    }

    host.default_input_device()
        .ok_or_else(|| anyhow!("no default input device found"))
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    let channels = channels.max(1);
    for frame in data.chunks(channels) {
        let acc: f32 = frame.iter().map(|s| s.to_float_sample()).sum();
        let _ = prod.try_push(acc / channels as f32);
    }
}

fn analyze_loop(
    cons: &mut ringbuf::HeapCons<f32>,
    sample_rate_hz: u32,
    stop: &AtomicBool,
    features: &AtomicAudioFeatures,
) {
    let n = 1024usize;
    let hop = 256usize;

    let mut scratch = vec![0.0f32; n];
    let mut write_pos = 0usize;
    let mut filled = 0usize;
    let mut since_last = 0usize;

    let hann = (0..n)
        .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / (n as f32)).cos())
        .collect::<Vec<_>>();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut spectrum = Spectrum::new(n);

    let mut flux_avg = 0.0f32;
    let mut flux_hist = [0.0f32; 3];

    while !stop.load(Ordering::Relaxed) {
        let mut got_any = false;
        while let Some(s) = cons.try_pop() {
            got_any = true;
            scratch[write_pos] = s;
            write_pos = (write_pos + 1) % n;
            filled = (filled + 1).min(n);
            since_last += 1;
            if filled < n || since_last < hop {
                continue;
            }
            since_last = 0;

            let (volume, bands, flux) =
                spectrum.analyze(&scratch, write_pos, &hann, &*fft, sample_rate_hz);

            flux_hist = [flux_hist[1], flux_hist[2], flux];
            flux_avg = flux_avg * 0.95 + flux * 0.05;

            // Peak detection with 1-step latency.
            let peak = flux_hist[1] > flux_hist[0] && flux_hist[1] > flux_hist[2];
            let thr = (flux_avg * 1.45).max(1e-6);

            features.store(AudioFeatureSnapshot {
                volume,
                bass: bands[0],
                mid: bands[1],
                treble: bands[2],
                beat: peak && flux_hist[1] > thr,
            });
        }

        if !got_any {
            thread::sleep(Duration::from_millis(1));
        }
    }
}

struct Spectrum {
    buf: Vec<Complex<f32>>,
    mags: Vec<f32>,
    prev_mags: Vec<f32>,
}

impl Spectrum {
    fn new(n: usize) -> Self {
        Self {
            buf: vec![Complex { re: 0.0, im: 0.0 }; n],
            mags: vec![0.0; n / 2],
            prev_mags: vec![0.0; n / 2],
        }
    }

    /// Returns `(rms, [bass, mid, treble], flux)`, all roughly in `0..1`.
    fn analyze(
        &mut self,
        scratch: &[f32],
        write_pos: usize,
        hann: &[f32],
        fft: &dyn rustfft::Fft<f32>,
        sample_rate_hz: u32,
    ) -> (f32, [f32; 3], f32) {
        let n = self.buf.len();
        let half = self.mags.len();

        let mut rms_acc = 0.0f32;
        for i in 0..n {
            let s = scratch[(write_pos + i) % n];
            rms_acc += s * s;
            self.buf[i] = Complex {
                re: s * hann[i],
                im: 0.0,
            };
        }
        let rms = (rms_acc / n as f32).sqrt().clamp(0.0, 1.0);

        fft.process(&mut self.buf);
        for (m, c) in self.mags.iter_mut().zip(self.buf.iter()) {
            *m = c.norm();
        }

        let mut flux = 0.0f32;
        for (m, p) in self.mags.iter().zip(self.prev_mags.iter_mut()) {
            flux += (m - *p).max(0.0);
            *p = *m;
        }
        flux = (flux * 0.002 * (1024.0 / half.max(1) as f32)).tanh();

        // bass 20..250, mid 250..2000, treble 2000..16000 Hz
        let edges_hz = [20.0f32, 250.0, 2000.0, 16000.0];
        let mut sums = [0.0f32; 3];
        let mut counts = [0u32; 3];
        let sr = sample_rate_hz as f32;
        for i in 1..half {
            let f = i as f32 * sr / n as f32;
            if f < edges_hz[0] {
                continue;
            }
            if f >= edges_hz[3] {
                break;
            }
            let band = if f < edges_hz[1] {
                0
            } else if f < edges_hz[2] {
                1
            } else {
                2
            };
            sums[band] += self.mags[i];
            counts[band] += 1;
        }
        let bands = std::array::from_fn(|i| ((sums[i] / counts[i].max(1) as f32) * 0.01).tanh());

        (rms, bands, flux)
    }
}

fn clamp01(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}
