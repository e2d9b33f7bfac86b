use super::workflow::{IngestionPipeline, IngestionReport};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// 取り込み開始要求への応答
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerAck {
    /// バックグラウンドで実行を開始した
    Accepted,
    /// 実行中のため何もしなかった
    AlreadyRunning,
}

struct TriggerState {
    pipeline: IngestionPipeline,
    running: AtomicBool,
    last_report: RwLock<Option<IngestionReport>>,
}

// タスク終了時（パニック含む）に実行中フラグを戻す
struct RunningGuard(Arc<TriggerState>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

/// 取り込みをバックグラウンドタスクとして起動する窓口
///
/// 同時に走る取り込みは1つまで。実行中の要求は`AlreadyRunning`で拒否する。
#[derive(Clone)]
pub struct IngestionTrigger {
    state: Arc<TriggerState>,
}

impl IngestionTrigger {
    pub fn new(pipeline: IngestionPipeline) -> Self {
        Self {
            state: Arc::new(TriggerState {
                pipeline,
                running: AtomicBool::new(false),
                last_report: RwLock::new(None),
            }),
        }
    }

    /// 取り込みを開始し、すぐに応答を返す
    pub fn trigger(&self) -> TriggerAck {
        match self.spawn_run() {
            Some(_) => TriggerAck::Accepted,
            None => TriggerAck::AlreadyRunning,
        }
    }

    /// 取り込みを開始し、完了を待てるハンドルを返す
    /// 実行中なら`None`
    pub fn spawn_run(&self) -> Option<JoinHandle<IngestionReport>> {
        if self
            .state
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("取り込みが実行中のため要求を拒否");
            return None;
        }

        let guard = RunningGuard(self.state.clone());
        Some(tokio::spawn(async move {
            let report = guard.0.pipeline.run_ingestion().await;
            *guard.0.last_report.write().await = Some(report.clone());
            drop(guard);
            report
        }))
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// 最後に完了した取り込みの結果
    pub async fn last_report(&self) -> Option<IngestionReport> {
        self.state.last_report.read().await.clone()
    }

    pub fn pipeline(&self) -> &IngestionPipeline {
        &self.state.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::ArticleStore;
    use crate::domain::category::Category;
    use crate::domain::classifier::{Classifier, KeywordClassifier};
    use crate::domain::feed::Feed;
    use crate::domain::rss::FetchOptions;
    use crate::infra::api::http::MockHttpClient;
    use crate::infra::storage::db::create_memory_pool;
    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    const RSS_XML: &str = r#"<rss version="2.0"><channel><title>T</title>
        <item><title>Kubernetes 1.40 released</title><link>https://example.com/k8s</link></item>
        </channel></rss>"#;

    // 許可が出るまで分類を止めておく分類器
    struct GatedClassifier {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl Classifier for GatedClassifier {
        fn name(&self) -> &str {
            "gated"
        }

        async fn classify(&self, _text: &str) -> Category {
            let _permit = self.gate.acquire().await;
            Category::CloudComputing
        }
    }

    async fn trigger_with(classifier: Arc<dyn Classifier>) -> IngestionTrigger {
        let store = ArticleStore::new(create_memory_pool().await.unwrap());
        store.init().await.unwrap();
        let pipeline = IngestionPipeline::new(
            Arc::new(MockHttpClient::new_success(RSS_XML)),
            classifier,
            store,
            vec![Feed::new("test", "T", "https://example.com/rss")],
            FetchOptions::default(),
        );
        IngestionTrigger::new(pipeline)
    }

    #[tokio::test]
    async fn test_spawn_run_stores_last_report() {
        let trigger = trigger_with(Arc::new(KeywordClassifier)).await;
        assert!(trigger.last_report().await.is_none());

        let report = trigger.spawn_run().unwrap().await.unwrap();

        assert_eq!(report.saved, 1);
        assert!(!trigger.is_running());
        assert_eq!(trigger.last_report().await, Some(report));
        assert_eq!(trigger.pipeline().store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_runs_are_rejected() {
        let gate = Arc::new(Semaphore::new(0));
        let trigger = trigger_with(Arc::new(GatedClassifier { gate: gate.clone() })).await;

        let handle = trigger.spawn_run().expect("1回目は受け付けられるはず");
        assert!(trigger.is_running());
        assert_eq!(trigger.trigger(), TriggerAck::AlreadyRunning);

        gate.add_permits(10);
        let report = handle.await.unwrap();
        assert_eq!(report.saved, 1);
        assert!(!trigger.is_running());

        // 完了後は再び受け付ける
        assert_eq!(trigger.trigger(), TriggerAck::Accepted);
    }

    #[test]
    fn test_ack_serializes_as_snake_case() {
        let json = serde_json::to_string(&TriggerAck::AlreadyRunning).unwrap();
        assert_eq!(json, "\"already_running\"");
    }
}
