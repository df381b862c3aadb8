use anyhow::Result;
use clap::Parser;
use sheriff::cli::{Command, RootArgs};
use sheriff::commands;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    match args.command {
        Command::Tree(args) => commands::tree::run(&args).map(|()| ExitCode::SUCCESS),
        Command::WhatBroke(args) => commands::what_broke::run(&args).map(|()| ExitCode::SUCCESS),
        Command::WhoBrokeIt(args) => {
            commands::who_broke_it::run(&args).map(|()| ExitCode::SUCCESS)
        }
        Command::FailureReason(args) => commands::failure_reason::run(&args),
        Command::ResultsFor(args) => commands::results_for::run(&args).map(|()| ExitCode::SUCCESS),
        Command::LastGreen(args) => commands::last_green::run(&args).map(|()| ExitCode::SUCCESS),
        Command::BugsToCommit(args) => {
            commands::queues::run_bugs_to_commit(&args).map(|()| ExitCode::SUCCESS)
        }
        Command::PatchesInCommitQueue(args) => {
            commands::queues::run_patches_in_commit_queue(&args).map(|()| ExitCode::SUCCESS)
        }
        Command::PatchesToCommitQueue(args) => {
            commands::queues::run_patches_to_commit_queue(&args).map(|()| ExitCode::SUCCESS)
        }
        Command::PatchesToReview(args) => {
            commands::queues::run_patches_to_review(&args).map(|()| ExitCode::SUCCESS)
        }
        Command::Init(args) => commands::init::run(&args).map(|()| ExitCode::SUCCESS),
    }
}
