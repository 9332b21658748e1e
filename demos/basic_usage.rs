//! Demo: Basic task list usage
//!
//! Walks through creating, completing and clearing tasks with a file-backed
//! store, then reopens the store to show the list survived.
//!
//! Run with: cargo run --example basic_usage

use eyre::Result;
use tasklist::{DEFAULT_KEY, FileStorage, TaskStore, view};

fn main() -> Result<()> {
    // Create a temporary directory for this demo
    let temp_dir = tempfile::tempdir()?;
    let store_path = temp_dir.path().to_path_buf();

    println!("Tasklist Basic Usage Demo");
    println!("=========================\n");
    println!("Store path: {}\n", store_path.display());

    let mut store = TaskStore::open(FileStorage::open(&store_path)?, DEFAULT_KEY)?;

    println!("1. CREATE - Adding \"Buy milk\"...");
    let milk = store.create("Buy milk")[0].id;
    println!("{}\n", view::render(store.tasks()));

    println!("2. TOGGLE - Completing \"Buy milk\"...");
    println!("{}\n", view::render(store.toggle(milk)));

    println!("3. CREATE - Adding \"Walk dog\"...");
    println!("{}\n", view::render(store.create("Walk dog")));

    println!("4. CREATE - Blank input is ignored...");
    println!("   Total tasks: {}\n", store.create("   ").len());

    println!("5. CLEAR COMPLETED...");
    println!("{}\n", view::render(store.clear_completed()));

    println!("6. REOPEN - Loading from disk...");
    drop(store);
    let store = TaskStore::open(FileStorage::open(&store_path)?, DEFAULT_KEY)?;
    println!("{}\n", view::render(store.tasks()));

    println!("Demo complete!");
    Ok(())
}
