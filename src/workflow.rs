use thiserror::Error;
use tracing::info;

use crate::generator::{self, CompletionModel, GeneratedContent, GenerationContext, GeneratorError};
use crate::github::{GitHubError, SourceHost, TargetRef};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// What a run produced, for the driver to render.
#[derive(Debug)]
pub enum Outcome {
    /// PR path: the description was written back to the pull request.
    Updated {
        pr_url: String,
        content: GeneratedContent,
    },
    /// Compare path: content was generated but there is no PR to update.
    Preview {
        base: String,
        head: String,
        content: GeneratedContent,
    },
    /// Compare path with an empty diff; the model was never invoked.
    NoChanges { base: String, head: String },
}

/// The whole pipeline: fetch changes, generate content, and for the pull
/// request path write the description back. Strictly sequential; the
/// first error aborts the run.
pub async fn run(
    host: &dyn SourceHost,
    model: &dyn CompletionModel,
    target: TargetRef,
) -> Result<Outcome, WorkflowError> {
    match target {
        TargetRef::PullRequest {
            owner,
            repo,
            number,
        } => {
            info!(owner = %owner, repo = %repo, number, "fetching pull request");
            let (pr, files) = host.fetch_pull_request(&owner, &repo, number).await?;
            info!(files = files.len(), title = %pr.title, "fetched pull request");

            let context = GenerationContext {
                title: Some(pr.title),
                body: pr.body,
                base: Some(pr.base_ref),
                head: Some(pr.head_ref),
            };
            info!("generating title and description");
            let content = generator::generate(model, &files, &context).await?;

            info!("updating pull request description");
            host.update_description(&owner, &repo, number, &content.description)
                .await?;

            Ok(Outcome::Updated {
                pr_url: pr.html_url,
                content,
            })
        }
        TargetRef::Compare {
            owner,
            repo,
            base,
            head,
        } => {
            info!(owner = %owner, repo = %repo, base = %base, head = %head, "fetching comparison");
            let files = host.fetch_comparison(&owner, &repo, &base, &head).await?;

            if files.is_empty() {
                info!("comparison reports no changed files");
                return Ok(Outcome::NoChanges { base, head });
            }

            let context = GenerationContext {
                base: Some(base.clone()),
                head: Some(head.clone()),
                ..Default::default()
            };
            info!(files = files.len(), "generating title and description");
            let content = generator::generate(model, &files, &context).await?;

            Ok(Outcome::Preview {
                base,
                head,
                content,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{ChangedFile, PullRequestInfo};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn sample_file(path: &str, additions: u64, deletions: u64) -> ChangedFile {
        ChangedFile {
            path: path.to_string(),
            status: "modified".to_string(),
            additions,
            deletions,
            changes: additions + deletions,
            patch: None,
        }
    }

    /// Host that replays canned data and counts calls.
    #[derive(Default)]
    struct MockHost {
        pr: Option<(PullRequestInfo, Vec<ChangedFile>)>,
        comparison: Vec<ChangedFile>,
        fetch_calls: AtomicUsize,
        update_calls: AtomicUsize,
        updated_body: Mutex<Option<String>>,
    }

    #[async_trait]
    impl SourceHost for MockHost {
        async fn fetch_pull_request(
            &self,
            _owner: &str,
            _repo: &str,
            _number: u64,
        ) -> Result<(PullRequestInfo, Vec<ChangedFile>), GitHubError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pr.clone().unwrap())
        }

        async fn fetch_comparison(
            &self,
            _owner: &str,
            _repo: &str,
            _base: &str,
            _head: &str,
        ) -> Result<Vec<ChangedFile>, GitHubError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.comparison.clone())
        }

        async fn update_description(
            &self,
            _owner: &str,
            _repo: &str,
            _number: u64,
            description: &str,
        ) -> Result<(), GitHubError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            *self.updated_body.lock().unwrap() = Some(description.to_string());
            Ok(())
        }
    }

    /// Model that returns a fixed reply and counts invocations.
    struct MockModel {
        reply: String,
        calls: AtomicUsize,
    }

    impl MockModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionModel for MockModel {
        async fn complete(&self, _prompt: &str) -> Result<String, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_pull_request_path_reads_generates_and_writes_back() {
        let host = MockHost {
            pr: Some((
                PullRequestInfo {
                    number: 42,
                    title: "Add login".to_string(),
                    body: None,
                    html_url: "https://github.com/acme/widgets/pull/42".to_string(),
                    base_ref: "main".to_string(),
                    head_ref: "feature/login".to_string(),
                },
                vec![sample_file("login.ts", 50, 2)],
            )),
            ..Default::default()
        };
        let model = MockModel::new(
            r###"{"title":"feat(auth): add login flow","description":"## Summary\n..."}"###,
        );

        let target = TargetRef::PullRequest {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            number: 42,
        };
        let outcome = run(&host, &model, target).await.unwrap();

        assert_eq!(host.fetch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(host.update_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            host.updated_body.lock().unwrap().as_deref(),
            Some("## Summary\n...")
        );
        match outcome {
            Outcome::Updated { pr_url, content } => {
                assert_eq!(pr_url, "https://github.com/acme/widgets/pull/42");
                assert_eq!(content.title, "feat(auth): add login flow");
            }
            other => panic!("expected Updated outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_compare_path_generates_without_writing_back() {
        let host = MockHost {
            comparison: vec![sample_file("api.rs", 10, 3)],
            ..Default::default()
        };
        let model = MockModel::new(r#"{"title":"fix(api): tighten checks","description":"d"}"#);

        let target = TargetRef::Compare {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            base: "main".to_string(),
            head: "feature".to_string(),
        };
        let outcome = run(&host, &model, target).await.unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(host.update_calls.load(Ordering::SeqCst), 0);
        assert!(matches!(outcome, Outcome::Preview { .. }));
    }

    #[tokio::test]
    async fn test_empty_comparison_short_circuits_before_generation() {
        let host = MockHost::default();
        let model = MockModel::new(r#"{"title":"t","description":"d"}"#);

        let target = TargetRef::Compare {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            base: "main".to_string(),
            head: "feature".to_string(),
        };
        let outcome = run(&host, &model, target).await.unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(host.update_calls.load(Ordering::SeqCst), 0);
        match outcome {
            Outcome::NoChanges { base, head } => {
                assert_eq!(base, "main");
                assert_eq!(head, "feature");
            }
            other => panic!("expected NoChanges outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_model_reply_aborts_before_write_back() {
        let host = MockHost {
            pr: Some((
                PullRequestInfo {
                    number: 7,
                    title: "t".to_string(),
                    body: Some("b".to_string()),
                    html_url: "u".to_string(),
                    base_ref: "main".to_string(),
                    head_ref: "dev".to_string(),
                },
                vec![sample_file("a.rs", 1, 1)],
            )),
            ..Default::default()
        };
        let model = MockModel::new("sorry, no JSON today");

        let target = TargetRef::PullRequest {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            number: 7,
        };
        let err = run(&host, &model, target).await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Generator(GeneratorError::Parse(_))
        ));
        assert_eq!(host.update_calls.load(Ordering::SeqCst), 0);
    }
}
