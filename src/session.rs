//! Editor session state machine.
//!
//! [`EditorSession`] owns the uploaded image, the prompt and the generation
//! phase for one editing session. The phase is a single tagged value, so a
//! result and an error can never be shown at the same time, and `Loading`
//! always corresponds to exactly one attempt in flight.
//!
//! Generation is split into [`EditorSession::begin_generate`] and
//! [`EditorSession::complete_generate`] so a front end can keep handling
//! input while the request is awaited. [`EditorSession::generate`] runs both
//! halves back to back.

use crate::error::{EditorError, Result};
use crate::image::{
    ingest, EditRequest, FileSource, GeneratedImage, GenerationClient, GenerationResult,
    UploadedImage,
};
use std::path::{Path, PathBuf};

/// File name used when downloading a result without an explicit path.
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "edited-image.png";

/// Generation lifecycle of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing generated yet, or the last result was cleared.
    #[default]
    Idle,
    /// An attempt is in flight.
    Loading,
    /// The last attempt produced an image.
    Done(GeneratedImage),
    /// The last attempt ended with a user-visible message.
    Failed(Failure),
}

impl Phase {
    /// Short name for display.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }
}

/// A failed attempt, kept as display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Error kind, see [`EditorError::kind`].
    pub kind: &'static str,
    /// Message shown to the user.
    pub message: String,
}

impl From<&EditorError> for Failure {
    fn from(err: &EditorError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Identifies one generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(u64);

/// An attempt that has been started and must be completed by the caller.
#[derive(Debug, Clone)]
#[must_use = "a started generation must be completed"]
pub struct PendingGeneration {
    /// Attempt this request belongs to.
    pub attempt: AttemptId,
    /// Request to send.
    pub request: EditRequest,
}

/// What happened to an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The image replaced the previous one.
    Accepted,
    /// The file was not an image; nothing changed except the notice.
    Rejected,
    /// A drop with no files; nothing changed.
    Empty,
}

/// State for one editing session.
#[derive(Debug, Default)]
pub struct EditorSession {
    image: Option<UploadedImage>,
    prompt: String,
    phase: Phase,
    notice: Option<String>,
    in_flight: Option<AttemptId>,
    next_attempt: u64,
}

impl EditorSession {
    /// Creates an empty session in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current image, if any.
    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    /// The current prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The result image, when the last attempt succeeded.
    pub fn result(&self) -> Option<&GeneratedImage> {
        match &self.phase {
            Phase::Done(image) => Some(image),
            _ => None,
        }
    }

    /// The renderable URI of the result image.
    pub fn result_uri(&self) -> Option<String> {
        self.result().map(GeneratedImage::to_data_uri)
    }

    /// The message to show inline, newest first: a rejected upload, then a
    /// failed attempt.
    ///
    /// The notice is cleared whenever an attempt starts or finishes, so a
    /// notice that is present is always newer than the failure.
    pub fn message(&self) -> Option<&str> {
        if let Some(notice) = self.notice.as_deref() {
            return Some(notice);
        }
        match &self.phase {
            Phase::Failed(failure) => Some(&failure.message),
            _ => None,
        }
    }

    /// Returns true while an attempt is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Returns true when the generate action is enabled.
    pub fn can_generate(&self) -> bool {
        self.image.is_some() && !self.prompt.trim().is_empty() && !self.is_loading()
    }

    /// Accepts a picked or dropped file.
    ///
    /// A valid image replaces the current one and clears the previous result
    /// and message. A rejected file only sets the notice.
    pub fn upload(&mut self, source: FileSource) -> UploadOutcome {
        let Some(file) = source.into_file() else {
            return UploadOutcome::Empty;
        };

        match ingest(&file) {
            Ok(image) => {
                self.image = Some(image);
                self.notice = None;
                if !self.is_loading() {
                    self.phase = Phase::Idle;
                }
                UploadOutcome::Accepted
            }
            Err(e) => {
                self.notice = Some(e.to_string());
                UploadOutcome::Rejected
            }
        }
    }

    /// Replaces the prompt. Allowed in every phase.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Starts an attempt if the generate action is enabled.
    ///
    /// Returns `None` without touching state when no image is loaded, the
    /// prompt is blank, or another attempt is still in flight.
    pub fn begin_generate(&mut self) -> Option<PendingGeneration> {
        if !self.can_generate() {
            return None;
        }
        let image = self.image.clone()?;

        let attempt = AttemptId(self.next_attempt);
        self.next_attempt += 1;
        self.in_flight = Some(attempt);
        self.phase = Phase::Loading;
        self.notice = None;

        tracing::debug!(attempt = attempt.0, "generation started");
        Some(PendingGeneration {
            attempt,
            request: EditRequest::build(image, self.prompt.clone()),
        })
    }

    /// Applies the outcome of an attempt started by [`Self::begin_generate`].
    ///
    /// Results for an attempt that is no longer in flight are dropped. A
    /// reset during the attempt leaves the session in `Idle`.
    pub fn complete_generate(&mut self, attempt: AttemptId, result: GenerationResult) {
        if self.in_flight != Some(attempt) {
            tracing::debug!(attempt = attempt.0, "dropping result of stale attempt");
            return;
        }
        self.in_flight = None;

        if self.phase != Phase::Loading {
            tracing::debug!(attempt = attempt.0, "session reset during attempt");
            return;
        }

        self.notice = None;
        self.phase = match result {
            Ok(image) => Phase::Done(image),
            Err(e) => Phase::Failed(Failure::from(&e)),
        };
        tracing::debug!(attempt = attempt.0, phase = self.phase.name(), "generation finished");
    }

    /// Runs one full attempt against `client`.
    ///
    /// A no-op returning `false` when the generate action is disabled.
    pub async fn generate<C>(&mut self, client: &C) -> bool
    where
        C: GenerationClient + ?Sized,
    {
        let Some(pending) = self.begin_generate() else {
            return false;
        };
        let result = client.generate(&pending.request).await;
        self.complete_generate(pending.attempt, result);
        true
    }

    /// Clears image, prompt, result and message and returns to `Idle`.
    ///
    /// An attempt still in flight keeps the generate action disabled until it
    /// resolves; its result is then discarded.
    pub fn reset(&mut self) {
        self.image = None;
        self.prompt.clear();
        self.phase = Phase::Idle;
        self.notice = None;
    }

    /// Saves the result image into `dir` under the default file name.
    pub fn download_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(DEFAULT_DOWNLOAD_FILENAME);
        self.download(&path)?;
        Ok(path)
    }

    /// Saves the result image to `path`. Does not change the phase.
    pub fn download(&self, path: impl AsRef<Path>) -> Result<usize> {
        let image = self.result().ok_or(EditorError::NothingToDownload)?;
        let written = image.save(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), bytes = written, "downloaded result");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticCredentials;
    use crate::image::FileInput;
    use crate::image::providers::GeminiClientBuilder;
    use crate::testing::{image_response, text_response, RecordingTransport};

    fn picked(name: &str, media_type: &str, bytes: &[u8]) -> FileSource {
        FileSource::Picked(FileInput::new(name, media_type, bytes.to_vec()))
    }

    fn cat() -> FileSource {
        picked("cat.jpg", "image/jpeg", b"cat")
    }

    fn ready_session() -> EditorSession {
        let mut session = EditorSession::new();
        assert_eq!(session.upload(cat()), UploadOutcome::Accepted);
        session.set_prompt("make it a watercolor painting");
        session
    }

    #[test]
    fn test_new_session_is_idle_and_disabled() {
        let session = EditorSession::new();
        assert_eq!(session.phase(), &Phase::Idle);
        assert!(session.image().is_none());
        assert!(!session.can_generate());
        assert_eq!(session.message(), None);
    }

    #[test]
    fn test_rejected_upload_keeps_image_and_phase() {
        let mut session = ready_session();
        let before = session.image().cloned();

        let outcome = session.upload(picked("notes.txt", "text/plain", b"hi"));
        assert_eq!(outcome, UploadOutcome::Rejected);
        assert_eq!(session.image().cloned(), before);
        assert_eq!(session.phase(), &Phase::Idle);
        assert_eq!(session.message(), Some("Please upload an image file."));
    }

    #[test]
    fn test_reupload_replaces_image_and_clears_result() {
        let mut session = ready_session();
        let pending = session.begin_generate().unwrap();
        session.complete_generate(pending.attempt, Ok(GeneratedImage::new("image/png", "OLD")));
        assert!(session.result().is_some());

        session.upload(picked("dog.png", "image/png", b"dog"));
        assert_eq!(session.image().unwrap().media_type, "image/png");
        assert_eq!(session.image().unwrap().encoded_data, "ZG9n");
        assert_eq!(session.phase(), &Phase::Idle);
        assert!(session.result().is_none());
    }

    #[test]
    fn test_dropped_files_use_first() {
        let mut session = EditorSession::new();
        let files = vec![
            FileInput::new("a.txt", "text/plain", b"a".to_vec()),
            FileInput::new("b.png", "image/png", b"b".to_vec()),
        ];
        assert_eq!(session.upload(FileSource::Dropped(files)), UploadOutcome::Rejected);
        assert!(session.image().is_none());

        assert_eq!(session.upload(FileSource::Dropped(vec![])), UploadOutcome::Empty);
    }

    #[test]
    fn test_dropped_image_first_accepted() {
        let mut session = EditorSession::new();
        let files = vec![
            FileInput::new("cat.png", "image/png", b"cat".to_vec()),
            FileInput::new("notes.txt", "text/plain", b"hi".to_vec()),
        ];
        assert_eq!(session.upload(FileSource::Dropped(files)), UploadOutcome::Accepted);
        assert_eq!(session.image().unwrap().media_type, "image/png");
        assert_eq!(session.message(), None);
    }

    #[test]
    fn test_generate_requires_image_and_prompt() {
        let mut session = EditorSession::new();
        session.set_prompt("add a hat");
        assert!(session.begin_generate().is_none());

        let mut session = EditorSession::new();
        session.upload(cat());
        session.set_prompt("   ");
        assert!(session.begin_generate().is_none());
        assert_eq!(session.phase(), &Phase::Idle);
    }

    #[test]
    fn test_generate_while_loading_is_noop() {
        let mut session = ready_session();
        let pending = session.begin_generate().unwrap();
        assert_eq!(session.phase(), &Phase::Loading);
        assert_eq!(pending.request.instruction, "make it a watercolor painting");

        for _ in 0..5 {
            assert!(session.begin_generate().is_none());
        }
        assert_eq!(session.phase(), &Phase::Loading);

        session.complete_generate(pending.attempt, Ok(GeneratedImage::new("image/png", "AAAA")));
        assert!(session.can_generate());
    }

    #[test]
    fn test_prompt_and_upload_allowed_while_loading() {
        let mut session = ready_session();
        let pending = session.begin_generate().unwrap();

        session.set_prompt("now make it a sketch");
        session.upload(picked("dog.png", "image/png", b"dog"));
        assert_eq!(session.phase(), &Phase::Loading);
        assert!(!session.can_generate());

        // The in-flight attempt still lands on the new image.
        session.complete_generate(pending.attempt, Ok(GeneratedImage::new("image/png", "CAT")));
        assert_eq!(session.result().unwrap().encoded_data, "CAT");
        assert_eq!(session.prompt(), "now make it a sketch");
    }

    #[test]
    fn test_failure_sets_message() {
        let mut session = ready_session();
        let pending = session.begin_generate().unwrap();
        session.complete_generate(
            pending.attempt,
            Err(EditorError::generation_failed("API error: 500 - boom")),
        );

        match session.phase() {
            Phase::Failed(failure) => {
                assert_eq!(failure.kind, "generation_failed");
                assert_eq!(failure.message, "API error: 500 - boom");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(session.message(), Some("API error: 500 - boom"));
        assert!(session.result().is_none());
        assert!(session.can_generate());
    }

    #[test]
    fn test_rejected_upload_after_failure_shows_notice() {
        let mut session = ready_session();
        let pending = session.begin_generate().unwrap();
        session.complete_generate(
            pending.attempt,
            Err(EditorError::generation_failed("API error: 500 - boom")),
        );
        assert_eq!(session.message(), Some("API error: 500 - boom"));

        let outcome = session.upload(picked("notes.txt", "text/plain", b"hi"));
        assert_eq!(outcome, UploadOutcome::Rejected);
        assert_eq!(session.message(), Some("Please upload an image file."));
        assert!(matches!(session.phase(), Phase::Failed(_)));
        assert_eq!(session.image().unwrap().media_type, "image/jpeg");
    }

    #[test]
    fn test_failure_replaces_notice_from_loading() {
        let mut session = ready_session();
        let pending = session.begin_generate().unwrap();
        session.upload(picked("notes.txt", "text/plain", b"hi"));
        assert_eq!(session.message(), Some("Please upload an image file."));

        session.complete_generate(
            pending.attempt,
            Err(EditorError::generation_failed("API error: 500 - boom")),
        );
        assert_eq!(session.message(), Some("API error: 500 - boom"));
    }

    #[test]
    fn test_reset_during_loading_discards_result() {
        let mut session = ready_session();
        let pending = session.begin_generate().unwrap();
        session.reset();
        assert_eq!(session.phase(), &Phase::Idle);

        session.upload(cat());
        session.set_prompt("again");
        assert!(session.begin_generate().is_none());

        session.complete_generate(pending.attempt, Ok(GeneratedImage::new("image/png", "LATE")));
        assert_eq!(session.phase(), &Phase::Idle);
        assert!(session.result().is_none());
        assert!(session.can_generate());
    }

    #[test]
    fn test_stale_attempt_ignored() {
        let mut session = ready_session();
        let first = session.begin_generate().unwrap();
        session.complete_generate(first.attempt, Ok(GeneratedImage::new("image/png", "ONE")));

        let second = session.begin_generate().unwrap();
        session.complete_generate(first.attempt, Ok(GeneratedImage::new("image/png", "DUP")));
        assert_eq!(session.phase(), &Phase::Loading);

        session.complete_generate(second.attempt, Ok(GeneratedImage::new("image/png", "TWO")));
        assert_eq!(session.result().unwrap().encoded_data, "TWO");
    }

    #[tokio::test]
    async fn test_watercolor_scenario() {
        let transport = RecordingTransport::with_json(image_response("image/png", "ABC123"));
        let client = GeminiClientBuilder::new()
            .api_key("test-key")
            .build_with_transport(transport.clone());

        let mut session = ready_session();
        assert!(session.generate(&client).await);

        assert!(matches!(session.phase(), Phase::Done(_)));
        assert_eq!(
            session.result_uri().as_deref(),
            Some("data:image/png;base64,ABC123")
        );
        assert_eq!(transport.call_count(), 1);
        let body = transport.calls()[0].body.clone().unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["inline_data"]["mimeType"], "image/jpeg");
    }

    #[tokio::test]
    async fn test_text_only_scenario() {
        let transport = RecordingTransport::with_json(text_response("Sure! Here you go."));
        let client = GeminiClientBuilder::new()
            .api_key("test-key")
            .build_with_transport(transport);

        let mut session = ready_session();
        session.generate(&client).await;

        match session.phase() {
            Phase::Failed(failure) => {
                assert_eq!(failure.kind, "no_image_produced");
                assert!(failure.message.starts_with("No image was generated."));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_credential_scenario() {
        let transport = RecordingTransport::with_json(image_response("image/png", "ABC123"));
        let client = GeminiClientBuilder::new()
            .credentials(StaticCredentials::missing())
            .build_with_transport(transport.clone());

        let mut session = ready_session();
        session.generate(&client).await;

        match session.phase() {
            Phase::Failed(failure) => assert_eq!(failure.kind, "configuration"),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_noop_makes_no_call() {
        let transport = RecordingTransport::with_json(image_response("image/png", "ABC123"));
        let client = GeminiClientBuilder::new()
            .api_key("test-key")
            .build_with_transport(transport.clone());

        let mut session = EditorSession::new();
        assert!(!session.generate(&client).await);

        let mut session = ready_session();
        let _pending = session.begin_generate().unwrap();
        assert!(!session.generate(&client).await);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reset_after_done() {
        let transport = RecordingTransport::with_json(image_response("image/png", "ABC123"));
        let client = GeminiClientBuilder::new()
            .api_key("test-key")
            .build_with_transport(transport);

        let mut session = ready_session();
        session.generate(&client).await;
        session.reset();

        assert_eq!(session.phase(), &Phase::Idle);
        assert!(session.image().is_none());
        assert_eq!(session.prompt(), "");
        assert!(session.result().is_none());
        assert_eq!(session.message(), None);
    }

    #[test]
    fn test_download_writes_result() {
        let mut session = ready_session();
        let pending = session.begin_generate().unwrap();
        session.complete_generate(pending.attempt, Ok(GeneratedImage::new("image/png", "aGVsbG8=")));

        let dir = tempfile::tempdir().unwrap();
        let path = session.download_to_dir(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), DEFAULT_DOWNLOAD_FILENAME);
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        assert!(matches!(session.phase(), Phase::Done(_)));
    }

    #[test]
    fn test_download_without_result() {
        let session = ready_session();
        let dir = tempfile::tempdir().unwrap();
        let err = session.download(dir.path().join("out.png")).unwrap_err();
        assert!(matches!(err, EditorError::NothingToDownload));
    }
}
