// Demo Orchestrator - wires a sequencer and two replicas in one process
// and walks through the commit and conflict paths.

use anyhow::Result;
use replica::{Config as ReplicaConfig, Replica};
use sequencer::{Config as SequencerConfig, Sequencer};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use txn_client::{Config, Transaction};
use uuid::Uuid;

const REPLICA_COUNT: usize = 2;

pub struct DemoOrchestrator {
    replicas: Vec<Replica>,
    sequencer: Sequencer,
}

impl DemoOrchestrator {
    /// Start replicas (seeded with x = "init") and a sequencer in front of them
    pub async fn start() -> Result<Self> {
        let mut replicas = Vec::with_capacity(REPLICA_COUNT);
        for _ in 0..REPLICA_COUNT {
            let config = ReplicaConfig::listening_on("127.0.0.1:0").with_seed("x", "init");
            replicas.push(Replica::start(config).await?);
        }

        let addrs: Vec<String> = replicas.iter().map(|r| r.local_addr().to_string()).collect();
        let sequencer = Sequencer::start(SequencerConfig::new("127.0.0.1:0", addrs)).await?;

        Ok(Self {
            replicas,
            sequencer,
        })
    }

    fn client_config(&self) -> Config {
        Config::new(
            self.replicas
                .iter()
                .map(|r| r.local_addr().to_string())
                .collect(),
            self.sequencer.local_addr().to_string(),
        )
    }

    fn begin(&self, cid: &str) -> Transaction {
        Transaction::new(cid, Uuid::now_v7().to_string(), self.client_config())
    }

    /// Read x, overwrite it, commit
    pub async fn read_modify_write(&self) -> Result<()> {
        println!("\n📘 Scenario 1: read-modify-write");

        let mut tx = self.begin("c1");
        let value = tx.read("x").await?;
        println!("  Read(x) -> {:?}", String::from_utf8_lossy(&value));

        tx.write("x", "new");
        println!("  Write(x, \"new\")");

        let committed = tx.commit().await?;
        println!("  Commit -> {}", outcome(committed));
        Ok(())
    }

    /// Two transactions race on x; the one with the older read aborts
    pub async fn conflicting_writers(&self) -> Result<()> {
        println!("\n📙 Scenario 2: conflicting writers");

        let mut slow = self.begin("c-slow");
        let seen = slow.read("x").await?;
        let seen_version = slow.read_set().values().next().map(|e| e.version).unwrap_or(0);
        println!("  slow: Read(x) at v{}", seen_version);

        let mut fast = self.begin("c-fast");
        fast.write("x", "fast");
        println!("  fast: Commit -> {}", outcome(fast.commit().await?));

        slow.write("x", [seen, b"+slow".to_vec()].concat());
        println!("  slow: Commit -> {}", outcome(slow.commit().await?));
        Ok(())
    }

    /// Print what each replica holds for x
    pub fn report(&self) {
        println!("\n📊 Replica state");
        for replica in &self.replicas {
            let stored = replica.store().read(&"x".into());
            println!(
                "  {} x={:?} v{} (commit counter {})",
                replica.local_addr(),
                String::from_utf8_lossy(&stored.value),
                stored.version,
                replica.store().commit_counter()
            );
        }
        let metrics = self.sequencer.metrics();
        println!(
            "  sequencer: {} rounds, {} committed, {} aborted",
            metrics.rounds_total.get(),
            metrics.commits_total.get(),
            metrics.aborts_total.get()
        );
    }

    pub async fn shutdown(self) -> Result<()> {
        self.sequencer.shutdown().await?;
        for replica in self.replicas {
            replica.shutdown().await?;
        }
        Ok(())
    }
}

fn outcome(committed: bool) -> &'static str {
    if committed {
        "✅ committed"
    } else {
        "❌ aborted"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("\n🚀 =================================================================");
    println!("🚀 OCC replicated store - demo");
    println!("🚀 =================================================================");

    let demo = DemoOrchestrator::start().await?;
    info!("Demo cluster up");

    demo.read_modify_write().await?;
    demo.conflicting_writers().await?;
    demo.report();

    demo.shutdown().await?;
    println!("\n🎉 Demo complete\n");
    Ok(())
}
