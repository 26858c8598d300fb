use cucumber::writer::{Basic, JUnit};
use cucumber::writer::{Verbosity, basic::Coloring};
use cucumber::{World, WriterExt};
use stashbox_test::world::StashboxWorld;
use std::fs::{File, create_dir_all};
use std::io::stdout;
use std::path::PathBuf;

#[tokio::main]
pub async fn main() {
    // CARGO_MANIFEST_DIR points to stashbox-test; reports go to the workspace target dir
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir
        .parent()
        .expect("Failed to find workspace root");
    let target_dir = workspace_root.join("target");

    create_dir_all(&target_dir).expect("Failed to create target directory");

    let junit_path = target_dir.join("cucumber-junit.xml");
    let file = File::create(&junit_path).expect("Failed to create JUnit XML file");

    StashboxWorld::cucumber()
        .max_concurrent_scenarios(None)
        .with_writer(
            Basic::new(stdout(), Coloring::Auto, Verbosity::Default)
                .summarized()
                .tee(JUnit::for_tee(file, 0))
                .normalized(),
        )
        .run_and_exit("tests/features")
        .await;
}
