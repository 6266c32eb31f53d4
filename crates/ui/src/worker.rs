use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use shelfdeck_application::{PageRequest, ScreenToken};
use shelfdeck_client::{BackendClient, ClientError, PageRef};
use shelfdeck_core::{
    Command, CommandStatus, Library, LogsResponse, Series, ServerSettings, ServerSettingsUpdate,
    ServerStatus, SettingsUpdateResponse, Volume,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CoverKey {
    Series(u64),
    Volume(u64),
}

#[derive(Debug, Clone)]
pub(crate) enum Job {
    Status,
    Libraries,
    Series(u64),
    Volumes(u64),
    Command(Command),
    Cover(CoverKey),
    Page { volume: Volume, request: PageRequest },
    ServerSettings,
    SaveServerSettings(ServerSettingsUpdate),
    Logs,
}

impl Job {
    fn label(&self) -> &'static str {
        match self {
            Job::Status => "status",
            Job::Libraries => "libraries",
            Job::Series(_) => "series",
            Job::Volumes(_) => "volumes",
            Job::Command(_) => "command",
            Job::Cover(_) => "cover",
            Job::Page { .. } => "page",
            Job::ServerSettings => "server-settings",
            Job::SaveServerSettings(_) => "save-server-settings",
            Job::Logs => "logs",
        }
    }
}

pub(crate) enum Payload {
    Status(ServerStatus),
    Libraries(Vec<Library>),
    Series(Vec<Series>),
    Volumes(Vec<Volume>),
    Command(CommandStatus),
    Image(image::DynamicImage),
    ServerSettings(ServerSettings),
    SettingsSaved(SettingsUpdateResponse),
    Logs(LogsResponse),
}

pub(crate) struct JobResult {
    pub token: ScreenToken,
    pub job: Job,
    pub outcome: Result<Payload, ClientError>,
}

/// Runs blocking backend calls off the UI thread; results come back over a channel.
pub(crate) struct Worker {
    client: BackendClient,
    tx: Sender<JobResult>,
    rx: Receiver<JobResult>,
}

impl Worker {
    pub fn new(client: BackendClient) -> Self {
        let (tx, rx) = unbounded();
        Self { client, tx, rx }
    }

    pub fn results(&self) -> &Receiver<JobResult> {
        &self.rx
    }

    pub fn spawn(&self, token: ScreenToken, job: Job) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let name = format!("job-{}", job.label());
        let spawned = thread::Builder::new().name(name).spawn(move || {
            let outcome = run(&client, &job);
            if let Err(err) = &outcome {
                tracing::warn!(job = job.label(), error = %err, "backend request failed");
            }
            let _ = tx.send(JobResult {
                token,
                job,
                outcome,
            });
        });
        if let Err(err) = spawned {
            tracing::error!(error = %err, "failed to spawn worker thread");
        }
    }
}

fn decode_image(bytes: &[u8]) -> Result<image::DynamicImage, ClientError> {
    image::load_from_memory(bytes).map_err(|err| ClientError::Decode(format!("image: {err}")))
}

fn run(client: &BackendClient, job: &Job) -> Result<Payload, ClientError> {
    Ok(match job {
        Job::Status => Payload::Status(client.status()?),
        Job::Libraries => Payload::Libraries(client.libraries()?),
        Job::Series(library_id) => Payload::Series(client.series(*library_id)?),
        Job::Volumes(series_id) => Payload::Volumes(client.volumes(*series_id)?),
        Job::Command(command) => Payload::Command(client.command(*command)?),
        Job::Cover(CoverKey::Series(id)) => Payload::Image(decode_image(&client.series_cover(*id)?)?),
        Job::Cover(CoverKey::Volume(id)) => Payload::Image(decode_image(&client.volume_cover(*id)?)?),
        Job::Page { volume, request } => {
            let page = PageRef {
                series_id: volume.series_id,
                volume_id: volume.volume_id,
                chapter_id: volume.chapter_id,
                page: request.page,
            };
            Payload::Image(decode_image(&client.page(page)?)?)
        }
        Job::ServerSettings => Payload::ServerSettings(client.server_settings()?),
        Job::SaveServerSettings(update) => {
            Payload::SettingsSaved(client.update_server_settings(update)?)
        }
        Job::Logs => Payload::Logs(client.logs()?),
    })
}
