//! Run orchestration: harvest → summarize → verify → compile.
//!
//! Each stage consumes the previous stage's complete output. Within a stage,
//! items may be processed `generation.concurrency` at a time, but results are
//! always collected in input order. Any unrecovered error aborts the run,
//! tagged with the stage it came from. The cancellation token is checked
//! between stages and before each item, and an in-flight item is abandoned
//! as soon as the token fires.

use crate::aggregator::VerificationAggregator;
use crate::api::AskAsync;
use crate::config::DigestConfig;
use crate::content::ContentFetcher;
use crate::error::{DigestError, Result, Stage};
use crate::fetcher::ArticleFetcher;
use crate::judge::VerificationJudge;
use crate::models::{Article, ArticleSummary, Digest, VerifiedSummary};
use crate::outputs::digest::write_digest;
use crate::outputs::markdown::digest_to_markdown;
use crate::search::SearchBackend;
use crate::summarizer::Summarizer;
use crate::trust::TrustFilter;
use crate::verifier::ClaimVerifier;
use chrono::{Local, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

pub struct DigestPipeline<'a, S, A> {
    config: &'a DigestConfig,
    backend: &'a S,
    trust: TrustFilter,
    summarizer: Summarizer<A>,
    judge: Option<VerificationJudge<A>>,
    content: Option<ContentFetcher>,
    aggregator: VerificationAggregator,
    cancel: CancellationToken,
}

impl<'a, S, A> DigestPipeline<'a, S, A>
where
    S: SearchBackend,
    A: AskAsync,
{
    pub fn new(config: &'a DigestConfig, backend: &'a S, summarizer: A, cancel: CancellationToken) -> Self {
        Self {
            config,
            backend,
            trust: TrustFilter::new(&config.verification.trusted_domains),
            summarizer: Summarizer::new(summarizer),
            judge: None,
            content: None,
            aggregator: VerificationAggregator::new(),
            cancel,
        }
    }

    /// Let the model weigh in on each summary's verification status.
    pub fn with_judge(mut self, judge: A) -> Self {
        self.judge = Some(VerificationJudge::new(judge));
        self
    }

    /// Download full article text after harvesting.
    pub fn with_content_fetcher(mut self, content: ContentFetcher) -> Self {
        self.content = Some(content);
        self
    }

    /// Execute one full run for `query`.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self, query: &str) -> Result<Digest> {
        let t0 = Instant::now();
        info!("Starting digest run");

        let result = self.run_stages(query).await;
        match &result {
            Ok(digest) => info!(
                stories = digest.stories.len(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Digest run complete"
            ),
            Err(DigestError::Cancelled) => info!("Digest run cancelled"),
            Err(e) => error!(error = %e, "Digest run failed"),
        }
        result
    }

    async fn run_stages(&self, query: &str) -> Result<Digest> {
        self.checkpoint()?;
        let articles = self
            .harvest(query)
            .await
            .map_err(|e| self.stage_failed(Stage::Harvest, e))?;

        self.checkpoint()?;
        let summaries = self
            .summarize_all(&articles)
            .await
            .map_err(|e| self.stage_failed(Stage::Summarize, e))?;

        self.checkpoint()?;
        let verified = self
            .verify_all(&summaries)
            .await
            .map_err(|e| self.stage_failed(Stage::Verify, e))?;

        self.checkpoint()?;
        Ok(self.compile(query, verified))
    }

    async fn harvest(&self, query: &str) -> Result<Vec<Article>> {
        let fetcher = ArticleFetcher::new(self.backend, &self.trust, self.config);
        let articles = self.guarded(async { Ok(fetcher.fetch(query).await) }).await?;
        info!(count = articles.len(), "Harvest stage complete");

        let Some(content) = &self.content else {
            return Ok(articles);
        };
        stream::iter(articles.iter())
            .map(|article| async move {
                self.checkpoint()?;
                self.guarded(async { Ok(content.enrich(article).await) }).await
            })
            .buffered(self.concurrency())
            .try_collect()
            .await
    }

    async fn summarize_all(&self, articles: &[Article]) -> Result<Vec<ArticleSummary>> {
        let summaries: Vec<ArticleSummary> = stream::iter(articles.iter().enumerate())
            .map(|(index, article)| async move {
                self.checkpoint()?;
                debug!(index, url = %article.url, "Summarizing article");
                self.guarded(self.summarizer.summarize(article)).await
            })
            .buffered(self.concurrency())
            .try_collect()
            .await?;
        info!(count = summaries.len(), "Summarize stage complete");
        Ok(summaries)
    }

    async fn verify_all(&self, summaries: &[ArticleSummary]) -> Result<Vec<VerifiedSummary>> {
        let verifier = ClaimVerifier::new(self.backend, &self.trust, self.config);
        let verifier = &verifier;

        let verified: Vec<VerifiedSummary> = stream::iter(summaries.iter())
            .map(|summary| async move {
                self.checkpoint()?;
                self.guarded(self.verify_one(verifier, summary)).await
            })
            .buffered(self.concurrency())
            .try_collect()
            .await?;
        info!(count = verified.len(), "Verify stage complete");
        Ok(verified)
    }

    async fn verify_one(
        &self,
        verifier: &ClaimVerifier<'_, S>,
        summary: &ArticleSummary,
    ) -> Result<VerifiedSummary> {
        let outcomes = verifier.verify_claims(&summary.key_points).await?;

        let any_sources = outcomes.iter().any(|o| !o.sources.is_empty());
        let verdict = match &self.judge {
            Some(judge) if any_sources => judge.judge(summary, &outcomes).await?,
            _ => None,
        };

        let verified = self.aggregator.aggregate(summary, &outcomes, verdict.as_ref());
        info!(
            url = %summary.url,
            status = %verified.verification_status,
            confidence = verified.confidence_score,
            "Verified summary"
        );
        Ok(verified)
    }

    fn compile(&self, query: &str, stories: Vec<VerifiedSummary>) -> Digest {
        let date = Local::now().date_naive();
        let markdown = digest_to_markdown(date, self.config.time_settings.lookback_hours, &stories);
        info!(%date, stories = stories.len(), bytes = markdown.len(), "Compile stage complete");
        Digest {
            date,
            generated_at: Utc::now(),
            query: query.to_string(),
            stories,
            markdown,
        }
    }

    /// Write the compiled digest into `output_dir`. Failures belong to the compile stage.
    #[instrument(level = "info", skip_all, fields(date = %digest.date))]
    pub async fn persist(&self, digest: &Digest, output_dir: impl AsRef<Path>) -> Result<PathBuf> {
        self.checkpoint()?;
        write_digest(output_dir, digest.date, &digest.markdown)
            .await
            .map_err(|e| self.stage_failed(Stage::Compile, e))
    }

    /// Run `work` unless the token fires first.
    async fn guarded<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DigestError::Cancelled),
            result = work => result,
        }
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(DigestError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn stage_failed(&self, stage: Stage, e: DigestError) -> DigestError {
        if !matches!(e, DigestError::Cancelled) {
            error!(%stage, error = %e, "Stage failed; aborting run");
        }
        e.in_stage(stage)
    }

    fn concurrency(&self) -> usize {
        self.config.generation.concurrency.max(1)
    }
}
