use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Args;
use crate::data;
use crate::map::label::LabelFont;
use crate::map::region::Feature;
use crate::tooltip::AttractionRecord;

/// Result of one background load
pub enum AssetEvent {
    Boundaries(Result<Vec<Feature>>),
    Font(Result<LabelFont>),
    Attractions(Result<Vec<AttractionRecord>>),
}

impl AssetEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AssetEvent::Boundaries(_) => "boundaries",
            AssetEvent::Font(_) => "font",
            AssetEvent::Attractions(_) => "attractions",
        }
    }
}

/// Start one loader thread per asset. Each load is attempted once and its
/// result sent on the returned channel; nothing is retried.
pub fn spawn_loaders(args: &Args) -> Receiver<AssetEvent> {
    let (tx, rx) = mpsc::channel();

    let boundary = args.boundary.clone();
    spawn(&tx, "boundaries", move || AssetEvent::Boundaries(load_boundaries_or_sample(boundary)));

    let font = args.font.clone();
    spawn(&tx, "font", move || AssetEvent::Font(data::load_font(&font)));

    let travel = args.travel.clone();
    spawn(&tx, "attractions", move || AssetEvent::Attractions(data::load_attractions(&travel)));

    rx
}

fn spawn<F>(tx: &Sender<AssetEvent>, name: &'static str, load: F)
where
    F: FnOnce() -> AssetEvent + Send + 'static,
{
    let tx = tx.clone();
    thread::spawn(move || {
        debug!(asset = name, "loading");
        // The receiver is gone once the app has quit
        let _ = tx.send(load());
    });
}

fn load_boundaries_or_sample(path: PathBuf) -> Result<Vec<Feature>> {
    if !path.exists() {
        info!(path = %path.display(), "boundary file not found, using built-in sample");
        return Ok(data::sample_features());
    }
    data::load_boundaries(&path)
}
