use std::time::Duration;

use chrono::Utc;
use log::info;
use sr_core::image_data;
use sr_core::params::{self, RenderDefaults, RenderOverrides};
use sr_core::poll::{self, POLL_BUDGET, POLL_INTERVAL_SECS, PollStep};
use sr_core::JobStatus;

use crate::backend::schemas::RenderRequest;
use crate::db::MetadataStore;
use crate::db::project::{Project, VISIBLE};
use crate::error::AppError;
use crate::render_client::{JobSnapshot, RenderService, SubmitReceipt};
use crate::storage::ObjectStore;

const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Drives one render request from validated input to a persisted result:
/// validate, store the before-image, submit the job, poll it to a terminal
/// state, store the after-image, upsert the metadata record. Every step
/// after validation is an external side effect and nothing is rolled back on
/// a later failure, so errors name the system that broke.
pub struct Pipeline {
    render: Box<dyn RenderService>,
    store: Box<dyn ObjectStore>,
    db: Box<dyn MetadataStore>,
    defaults: RenderDefaults,
}

/// A request with all mandatory fields present and the image decoded.
struct ValidRequest {
    environment: String,
    project_name: String,
    text: String,
    user: String,
    image_base64: String,
    image_bytes: Vec<u8>,
    architectural_style: Option<String>,
    weather: Option<String>,
    additional_options: Option<String>,
    hours: Option<String>,
    overrides: RenderOverrides,
}

impl Pipeline {
    pub fn new(
        render: Box<dyn RenderService>,
        store: Box<dyn ObjectStore>,
        db: Box<dyn MetadataStore>,
        defaults: RenderDefaults,
    ) -> Self {
        Self {
            render,
            store,
            db,
            defaults,
        }
    }

    pub async fn process(&self, request: RenderRequest) -> Result<String, AppError> {
        let req = validate(request)?;

        let before_key = format!("before_{}.jpg", req.project_name);
        let before_url = self
            .store
            .put(&before_key, req.image_bytes, IMAGE_CONTENT_TYPE)
            .await?;

        let input = params::resolve(&req.overrides, &self.defaults, req.image_base64);
        // Client-side tag for log correlation; the service-assigned id below
        // is what polling actually keys on.
        let task_tag = format!("task_{}_{}", req.project_name, Utc::now().timestamp_millis());
        info!("Submitting render job {task_tag} for project {}", req.project_name);

        let receipt = self.render.submit(&input).await?;
        info!("Render job {task_tag} accepted as {}", receipt.job_id);

        let snapshot = self.poll_to_terminal(&receipt).await?;

        let after_base64 = snapshot
            .images
            .first()
            .ok_or_else(|| AppError::upstream("render service", "result missing expected image"))?;
        let after_bytes = image_data::decode(&image_data::clean_base64(after_base64))
            .map_err(|e| AppError::upstream("render service", format!("result image: {e}")))?;

        let after_key = format!("after_{}.jpg", req.project_name);
        let after_url = self
            .store
            .put(&after_key, after_bytes, IMAGE_CONTENT_TYPE)
            .await?;

        self.db
            .upsert_project(Project {
                project_name: req.project_name.clone(),
                text: req.text,
                environment: req.environment,
                before_image_url: before_url,
                after_image_url: after_url.clone(),
                user: req.user,
                architectural_style: req.architectural_style,
                weather: req.weather,
                additional_options: req.additional_options,
                hours: req.hours,
                status: VISIBLE.to_string(),
            })
            .await?;

        info!("Project {} fully processed", req.project_name);

        Ok(after_url)
    }

    /// Bounded polling loop. A transport failure while checking status
    /// propagates as an upstream error; it is not the same as the job
    /// reporting a failed status, and neither is retried.
    async fn poll_to_terminal(&self, receipt: &SubmitReceipt) -> Result<JobSnapshot, AppError> {
        let mut status = receipt
            .status
            .as_deref()
            .map(JobStatus::parse)
            .unwrap_or(JobStatus::InQueue);
        let mut snapshot: Option<JobSnapshot> = None;
        let mut attempts = 0u32;

        loop {
            match poll::next_step(&status, attempts, POLL_BUDGET) {
                PollStep::Continue => {
                    tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;
                    let snap = self.render.status(&receipt.job_id).await?;
                    status = JobStatus::parse(&snap.status);
                    snapshot = Some(snap);
                    attempts += 1;
                }
                PollStep::Completed => {
                    return match snapshot {
                        Some(snap) => Ok(snap),
                        // the submit response itself already reported
                        // completion; one status call fetches the output
                        None => self.render.status(&receipt.job_id).await,
                    };
                }
                PollStep::Failed | PollStep::BudgetExhausted => {
                    return Err(AppError::JobFailed {
                        job_id: receipt.job_id.clone(),
                        status: status.to_string(),
                    });
                }
            }
        }
    }
}

fn validate(request: RenderRequest) -> Result<ValidRequest, AppError> {
    let environment = require(request.environment, "environment")?;
    let project_name = require(request.project_name, "projectName")?;
    let text = require(request.text, "text")?;
    let user = require(request.user, "user")?;
    let raw = require(request.base64, "base64")?;

    let image_base64 = image_data::clean_base64(&raw);
    let image_bytes =
        image_data::decode(&image_base64).map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(ValidRequest {
        environment,
        project_name,
        text,
        user,
        image_base64,
        image_bytes,
        architectural_style: request.architectural_style,
        weather: request.weather,
        additional_options: request.additional_options,
        hours: request.hours,
        overrides: RenderOverrides {
            model: request.model,
            negative_prompt: request.neg,
            seed: request.seed,
            sampler_name: request.sampler_name,
            cfg_scale: request.cfg_scale,
            steps: request.steps,
            width: request.width,
            height: request.height,
        },
    })
}

fn require(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!(
            "missing required field: {field}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use sr_core::params::JobInput;

    // "hello" in base64
    const IMAGE_B64: &str = "aGVsbG8=";
    const OUTPUT_B64: &str = "d29ybGQ=";

    #[derive(Clone, Default)]
    struct FakeRender {
        submit_calls: Arc<AtomicUsize>,
        status_calls: Arc<AtomicUsize>,
        // status reported by the submit acknowledgement; None means IN_QUEUE
        submit_status: Arc<Mutex<Option<String>>>,
        // drained front to back; an empty queue keeps answering IN_PROGRESS
        responses: Arc<Mutex<VecDeque<Result<JobSnapshot, AppError>>>>,
    }

    impl FakeRender {
        fn queue(&self, snapshots: Vec<JobSnapshot>) {
            self.queue_results(snapshots.into_iter().map(Ok).collect());
        }

        fn queue_results(&self, results: Vec<Result<JobSnapshot, AppError>>) {
            *self.responses.lock().unwrap() = results.into();
        }
    }

    #[async_trait]
    impl RenderService for FakeRender {
        async fn submit(&self, _input: &JobInput) -> Result<SubmitReceipt, AppError> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            let status = self
                .submit_status
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| "IN_QUEUE".to_string());
            Ok(SubmitReceipt {
                job_id: "job-1".to_string(),
                status: Some(status),
            })
        }

        async fn status(&self, _job_id: &str) -> Result<JobSnapshot, AppError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(snapshot("IN_PROGRESS", vec![])))
        }
    }

    #[derive(Clone, Default)]
    struct FakeStore {
        puts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn put(
            &self,
            key: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, AppError> {
            self.puts.lock().unwrap().push(key.to_string());
            Ok(format!("https://cdn.test/{key}"))
        }
    }

    #[derive(Clone, Default)]
    struct FakeDb {
        upserts: Arc<Mutex<Vec<Project>>>,
    }

    #[async_trait]
    impl MetadataStore for FakeDb {
        async fn upsert_project(&self, project: Project) -> Result<(), AppError> {
            self.upserts.lock().unwrap().push(project);
            Ok(())
        }
    }

    fn snapshot(status: &str, images: Vec<&str>) -> JobSnapshot {
        JobSnapshot {
            status: status.to_string(),
            images: images.into_iter().map(String::from).collect(),
        }
    }

    fn defaults() -> RenderDefaults {
        RenderDefaults {
            prompt: "a cozy living room".to_string(),
            negative_prompt: "blurry".to_string(),
            seed: -1,
            steps: 30,
            cfg_scale: 7.0,
            denoising_strength: 0.75,
            image_cfg_scale: 1.5,
        }
    }

    fn request() -> RenderRequest {
        RenderRequest {
            base64: Some(IMAGE_B64.to_string()),
            environment: Some("indoor".to_string()),
            project_name: Some("villa".to_string()),
            text: Some("renovated kitchen".to_string()),
            user: Some("ana".to_string()),
            architectural_style: Some("modern".to_string()),
            weather: None,
            additional_options: None,
            hours: None,
            neg: None,
            seed: None,
            sampler_name: None,
            cfg_scale: None,
            steps: None,
            width: None,
            height: None,
            model: None,
        }
    }

    fn pipeline(render: &FakeRender, store: &FakeStore, db: &FakeDb) -> Pipeline {
        Pipeline::new(
            Box::new(render.clone()),
            Box::new(store.clone()),
            Box::new(db.clone()),
            defaults(),
        )
    }

    #[tokio::test]
    async fn test_missing_required_field_has_no_side_effects() {
        let missing: [fn(&mut RenderRequest); 5] = [
            |r| r.base64 = None,
            |r| r.environment = None,
            |r| r.project_name = None,
            |r| r.text = None,
            |r| r.user = None,
        ];

        for blank in missing {
            let (render, store, db) = (FakeRender::default(), FakeStore::default(), FakeDb::default());
            let mut req = request();
            blank(&mut req);

            let err = pipeline(&render, &store, &db).process(req).await.unwrap_err();

            assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
            assert_eq!(render.submit_calls.load(Ordering::SeqCst), 0);
            assert_eq!(render.status_calls.load(Ordering::SeqCst), 0);
            assert!(store.puts.lock().unwrap().is_empty());
            assert!(db.upserts.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_invalid_base64_fails_before_any_upload() {
        let (render, store, db) = (FakeRender::default(), FakeStore::default(), FakeDb::default());
        let mut req = request();
        req.base64 = Some("!!!not base64!!!".to_string());

        let err = pipeline(&render, &store, &db).process(req).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
        assert!(store.puts.lock().unwrap().is_empty());
        assert_eq!(render.submit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_on_first_poll() {
        let (render, store, db) = (FakeRender::default(), FakeStore::default(), FakeDb::default());
        render.queue(vec![snapshot("COMPLETED", vec![OUTPUT_B64])]);

        let url = pipeline(&render, &store, &db).process(request()).await.unwrap();

        assert_eq!(url, "https://cdn.test/after_villa.jpg");
        assert_eq!(render.submit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(render.status_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *store.puts.lock().unwrap(),
            vec!["before_villa.jpg".to_string(), "after_villa.jpg".to_string()]
        );
        let upserts = db.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].status, VISIBLE);
        assert_eq!(upserts[0].before_image_url, "https://cdn.test/before_villa.jpg");
        assert_eq!(upserts[0].after_image_url, "https://cdn.test/after_villa.jpg");
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_on_the_last_allowed_attempt() {
        let (render, store, db) = (FakeRender::default(), FakeStore::default(), FakeDb::default());
        let mut responses: Vec<JobSnapshot> =
            (0..19).map(|_| snapshot("IN_PROGRESS", vec![])).collect();
        responses.push(snapshot("COMPLETED", vec![OUTPUT_B64]));
        render.queue(responses);

        let url = pipeline(&render, &store, &db).process(request()).await.unwrap();

        assert_eq!(url, "https://cdn.test/after_villa.jpg");
        assert_eq!(render.status_calls.load(Ordering::SeqCst), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_budget_exhaustion() {
        let (render, store, db) = (FakeRender::default(), FakeStore::default(), FakeDb::default());
        // empty queue: the job never leaves IN_PROGRESS

        let err = pipeline(&render, &store, &db).process(request()).await.unwrap_err();

        match err {
            AppError::JobFailed { job_id, status } => {
                assert_eq!(job_id, "job-1");
                assert_eq!(status, "IN_PROGRESS");
            }
            other => panic!("expected JobFailed, got {other:?}"),
        }
        assert_eq!(render.status_calls.load(Ordering::SeqCst), 20);
        // the before-image upload is not rolled back
        assert_eq!(*store.puts.lock().unwrap(), vec!["before_villa.jpg".to_string()]);
        assert!(db.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_while_polling_is_not_a_job_failure() {
        let (render, store, db) = (FakeRender::default(), FakeStore::default(), FakeDb::default());
        render.queue_results(vec![
            Ok(snapshot("IN_PROGRESS", vec![])),
            Err(AppError::upstream("render service", "connection reset")),
        ]);

        let err = pipeline(&render, &store, &db).process(request()).await.unwrap_err();

        match err {
            AppError::Upstream { system, message } => {
                assert_eq!(system, "render service");
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
        assert_eq!(render.status_calls.load(Ordering::SeqCst), 2);
        // the before-image upload is not rolled back; nothing else happens
        assert_eq!(*store.puts.lock().unwrap(), vec!["before_villa.jpg".to_string()]);
        assert!(db.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_reporting_completed_fetches_output_with_one_call() {
        let (render, store, db) = (FakeRender::default(), FakeStore::default(), FakeDb::default());
        *render.submit_status.lock().unwrap() = Some("COMPLETED".to_string());
        render.queue(vec![snapshot("COMPLETED", vec![OUTPUT_B64])]);

        let url = pipeline(&render, &store, &db).process(request()).await.unwrap();

        assert_eq!(url, "https://cdn.test/after_villa.jpg");
        assert_eq!(render.submit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(render.status_calls.load(Ordering::SeqCst), 1);
        assert_eq!(db.upserts.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_aborts_without_resubmission() {
        let (render, store, db) = (FakeRender::default(), FakeStore::default(), FakeDb::default());
        render.queue(vec![snapshot("FAILED", vec![])]);

        let err = pipeline(&render, &store, &db).process(request()).await.unwrap_err();

        match err {
            AppError::JobFailed { status, .. } => assert_eq!(status, "FAILED"),
            other => panic!("expected JobFailed, got {other:?}"),
        }
        assert_eq!(render.submit_calls.load(Ordering::SeqCst), 1);
        assert!(db.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_without_output_image() {
        let (render, store, db) = (FakeRender::default(), FakeStore::default(), FakeDb::default());
        render.queue(vec![snapshot("COMPLETED", vec![])]);

        let err = pipeline(&render, &store, &db).process(request()).await.unwrap_err();

        match err {
            AppError::Upstream { system, message } => {
                assert_eq!(system, "render service");
                assert!(message.contains("missing expected image"));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
        assert_eq!(*store.puts.lock().unwrap(), vec!["before_villa.jpg".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rerun_overwrites_the_same_keys() {
        let (render, store, db) = (FakeRender::default(), FakeStore::default(), FakeDb::default());

        render.queue(vec![snapshot("COMPLETED", vec![OUTPUT_B64])]);
        pipeline(&render, &store, &db).process(request()).await.unwrap();

        let mut second = request();
        second.text = Some("second pass".to_string());
        render.queue(vec![snapshot("COMPLETED", vec![OUTPUT_B64])]);
        pipeline(&render, &store, &db).process(second).await.unwrap();

        assert_eq!(
            *store.puts.lock().unwrap(),
            vec![
                "before_villa.jpg".to_string(),
                "after_villa.jpg".to_string(),
                "before_villa.jpg".to_string(),
                "after_villa.jpg".to_string(),
            ]
        );
        let upserts = db.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 2);
        assert_eq!(upserts.last().unwrap().text, "second pass");
    }
}
