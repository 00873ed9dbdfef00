//! Course driver: plans courses on a producer thread and feeds the worker pool.

use std::thread;

use crate::cancel::CancelToken;
use crate::config::RunConfig;
use crate::executor::Executor;
use crate::plan::{plan_course, CoursePlan, PlanError};
use crate::pool::{Producer, RunError, RunSummary, WorkerPool};
use crate::retry::RetryPolicy;
use crate::source::CourseExport;

/// One backup run over a list of courses.
#[derive(Debug, Clone)]
pub struct BackupJob {
    config: RunConfig,
    policy: RetryPolicy,
    cancel: CancelToken,
}

impl BackupJob {
    /// Backoff timing comes from `policy`; the attempt budget is always
    /// `config.retry_count + 1`.
    pub fn new(config: RunConfig, policy: RetryPolicy) -> Self {
        let policy = RetryPolicy {
            retry_count: config.retry_count,
            ..policy
        };
        Self {
            config,
            policy,
            cancel: CancelToken::new(),
        }
    }

    /// Observe `cancel` (e.g. wired to Ctrl-C) instead of a private token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Plan and mirror `courses` in order.
    ///
    /// Each course's directories exist before any of its items is queued. A
    /// planning failure stops the run; items of earlier courses that were
    /// already queued may still complete.
    pub fn run<E>(&self, courses: &[CourseExport], executor: &E) -> Result<RunSummary, RunError>
    where
        E: Executor + Sync + ?Sized,
    {
        let (pool, producer) =
            WorkerPool::with_cancel(self.config.workers, self.policy, self.cancel.clone());
        let config = &self.config;

        thread::scope(|s| {
            let spawned = thread::Builder::new()
                .name("planner".into())
                .spawn_scoped(s, move || feed(courses, config, producer));
            if let Err(e) = spawned {
                tracing::error!("failed to spawn planner thread: {}", e);
                self.cancel.cancel();
                return Err(RunError::Spawn(e));
            }
            pool.run(executor)
        })
    }
}

fn feed(courses: &[CourseExport], config: &RunConfig, producer: Producer) {
    for export in courses {
        let course = &export.course;
        if producer.is_cancelled() {
            tracing::debug!(course = course.id, "run cancelled, not planning");
            return;
        }
        let plan = match prepare(export, config) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!(course = course.id, "planning failed: {}", e);
                producer.fail(e);
                return;
            }
        };
        tracing::info!(
            course = course.id,
            title = %course.title,
            dir = %plan.course_dir.display(),
            items = plan.items.len(),
            "backing up course"
        );
        for item in plan.items {
            if producer.enqueue(item).is_err() {
                tracing::debug!(course = course.id, "run cancelled, no more items");
                return;
            }
        }
    }
    producer.close();
}

fn prepare(export: &CourseExport, config: &RunConfig) -> Result<CoursePlan, PlanError> {
    let plan = plan_course(&export.course, &export.curriculum, config)?;
    plan.create_directories()?;
    Ok(plan)
}

/// Run a full backup with a private cancellation token.
pub fn run_backup<E>(
    courses: &[CourseExport],
    config: &RunConfig,
    policy: RetryPolicy,
    executor: &E,
) -> Result<RunSummary, RunError>
where
    E: Executor + Sync + ?Sized,
{
    BackupJob::new(config.clone(), policy).run(courses, executor)
}

/// Plan every course without touching the filesystem.
pub fn plan_only(courses: &[CourseExport], config: &RunConfig) -> Result<Vec<CoursePlan>, PlanError> {
    courses
        .iter()
        .map(|e| plan_course(&e.course, &e.curriculum, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::FsExecutor;
    use crate::fetch::{FetchError, Fetcher};
    use crate::model::{Asset, Chapter, Course, Curriculum, CurriculumNode, Lecture};
    use std::io::Write;
    use std::path::Path;

    /// Body is the URL itself.
    struct EchoFetcher;

    impl Fetcher for EchoFetcher {
        fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
            sink.write_all(url.as_bytes()).map_err(FetchError::Sink)?;
            Ok(url.len() as u64)
        }
    }

    fn export(id: u64, slug: &str) -> CourseExport {
        CourseExport {
            course: Course {
                id,
                title: format!("Course {}", id),
                url: format!("/{}/", slug),
            },
            curriculum: Curriculum::new(vec![
                CurriculumNode::Chapter(Chapter {
                    id: 1,
                    title: "Start".into(),
                    index: 1,
                }),
                CurriculumNode::Lecture(Lecture {
                    id: 2,
                    title: "Welcome".into(),
                    index: 1,
                    assets: vec![Asset::Video {
                        mime: "video/mp4".into(),
                        label: "720".into(),
                        url: format!("https://cdn/{}/welcome.mp4", slug),
                    }],
                    supplementary: vec![Asset::ExternalLink {
                        title: "Home".into(),
                        url: "https://example.com".into(),
                    }],
                }),
            ]),
        }
    }

    fn config(root: &Path, restart: bool) -> RunConfig {
        RunConfig {
            workers: 2,
            restart,
            output_dir: root.to_path_buf(),
            ..RunConfig::default()
        }
    }

    #[test]
    fn mirrors_every_course() {
        let root = tempfile::tempdir().unwrap();
        let courses = [export(1, "first"), export(2, "second")];
        let cfg = config(root.path(), false);

        let summary = run_backup(
            &courses,
            &cfg,
            RetryPolicy::immediate(0),
            &FsExecutor::new(EchoFetcher, false),
        )
        .unwrap();

        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.written, 2);
        let video = root.path().join("first/1. Start/1. Welcome.mp4");
        assert_eq!(
            std::fs::read_to_string(video).unwrap(),
            "https://cdn/first/welcome.mp4"
        );
        assert!(root
            .path()
            .join("second/1. Start/1. Welcome/links.txt")
            .is_file());
    }

    #[test]
    fn second_run_with_restart_skips_everything() {
        let root = tempfile::tempdir().unwrap();
        let courses = [export(1, "first")];

        let exec = FsExecutor::new(EchoFetcher, false);
        run_backup(&courses, &config(root.path(), false), RetryPolicy::immediate(0), &exec).unwrap();

        let cfg = config(root.path(), true);
        let exec = FsExecutor::new(EchoFetcher, cfg.restart);
        let summary = run_backup(&courses, &cfg, RetryPolicy::immediate(0), &exec).unwrap();
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.downloaded + summary.written, 0);
    }

    #[test]
    fn planning_failure_stops_run_before_later_course() {
        let root = tempfile::tempdir().unwrap();
        let mut broken = export(2, "broken");
        broken.course.url = "no-slug".into();
        let courses = [broken, export(3, "third")];

        let err = run_backup(
            &courses,
            &config(root.path(), false),
            RetryPolicy::immediate(0),
            &FsExecutor::new(EchoFetcher, false),
        )
        .unwrap_err();

        assert!(matches!(err, RunError::Plan(PlanError::InvalidCourseUrl(_))));
        assert!(!root.path().join("third").exists());
    }

    #[test]
    fn cancelled_job_reports_cancelled() {
        let root = tempfile::tempdir().unwrap();
        let job = BackupJob::new(config(root.path(), false), RetryPolicy::immediate(0));
        job.cancel_token().cancel();

        let err = job
            .run(&[export(1, "first")], &FsExecutor::new(EchoFetcher, false))
            .unwrap_err();
        assert!(matches!(err, RunError::Cancelled));
        assert!(!root.path().join("first").exists());
    }

    #[test]
    fn attempt_budget_follows_run_config() {
        use crate::executor::{Outcome, TaskError};
        use crate::work::WorkItem;
        use std::sync::atomic::{AtomicU32, Ordering};

        struct AlwaysFails(AtomicU32);

        impl Executor for AlwaysFails {
            fn execute(&self, _: &WorkItem) -> Result<Outcome, TaskError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(TaskError::Transfer(FetchError::Http(500)))
            }
        }

        let root = tempfile::tempdir().unwrap();
        let mut course = export(1, "first");
        // Keep the chapter and a video-only lecture: exactly one work item.
        if let Some(CurriculumNode::Lecture(lecture)) = course.curriculum.nodes.get_mut(1) {
            lecture.supplementary.clear();
        }
        let cfg = RunConfig {
            retry_count: 3,
            ..config(root.path(), false)
        };
        let exec = AlwaysFails(AtomicU32::new(0));

        // The policy asks for no retries; the run config wins.
        let err = run_backup(&[course], &cfg, RetryPolicy::immediate(0), &exec).unwrap_err();

        assert!(matches!(err, RunError::Task { attempts: 4, .. }));
        assert_eq!(exec.0.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn plan_only_creates_nothing() {
        let root = tempfile::tempdir().unwrap();
        let plans = plan_only(&[export(1, "first")], &config(root.path(), false)).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].items.len(), 2);
        assert!(!plans[0].course_dir.exists());
    }
}
