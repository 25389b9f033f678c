use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use services::{AppServices, PlaybackGate, QuizLoopService, SuggestionDebouncer, SuggestionEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use ui::vm::{Feedback, PlaybackCue, QuizIntent, QuizVm, start_quiz};

use crate::command::{HELP, Input, parse_line};
use crate::terminal::{TerminalSink, render, render_progress, render_suggestions};

/// Start the current track's window, dropping tracks the sink cannot play.
async fn play_current(
    quiz_loop: &QuizLoopService,
    vm: &mut QuizVm,
    gate: &mut PlaybackGate,
) -> Result<()> {
    loop {
        let Some((url, window)) = vm.now_playing().map(|(url, w)| (url.to_string(), w)) else {
            gate.freeze();
            return Ok(());
        };
        match gate.start(&url, window) {
            Ok(()) => return Ok(()),
            Err(err) => {
                tracing::warn!(%err, %url, "preview could not start");
                vm.apply(quiz_loop, QuizIntent::PlaybackFailed)
                    .await
                    .map_err(|err| anyhow!(err.message()))?;
            }
        }
    }
}

async fn apply_intent(
    quiz_loop: &QuizLoopService,
    vm: &mut QuizVm,
    gate: &mut PlaybackGate,
    intent: QuizIntent,
) -> Result<()> {
    let feedback = match vm.apply(quiz_loop, intent).await {
        Ok(feedback) => feedback,
        Err(err) => {
            println!("{}", err.message());
            return Ok(());
        }
    };
    if let Some(message) = feedback.message() {
        println!("{message}");
    }
    match feedback.cue() {
        PlaybackCue::Restart => play_current(quiz_loop, vm, gate).await?,
        PlaybackCue::Freeze => gate.freeze(),
        PlaybackCue::Keep => {}
    }
    if feedback != Feedback::Ignored {
        render(&vm.screen(quiz_loop.clock().now()));
    }
    Ok(())
}

/// Run the interactive quiz until stdin closes or the player quits.
///
/// # Errors
///
/// Returns an error when today's tracks cannot be loaded or progress cannot be stored.
pub async fn run(services: &AppServices) -> Result<()> {
    let quiz_loop = services.quiz_loop();
    let config = services.config();

    let mut vm = start_quiz(&quiz_loop)
        .await
        .map_err(|err| anyhow!(err.message()))?;

    let (mut gate, mut playback_rx) = PlaybackGate::new(Arc::new(TerminalSink));
    let (mut debouncer, mut suggestion_rx) =
        SuggestionDebouncer::new(config.suggestion_debounce(), services.suggestion_provider());

    let mut cooldown_tick = tokio::time::interval(config.cooldown_poll_interval());
    cooldown_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut day_tick = tokio::time::interval(config.day_change_poll_interval());
    day_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    render(&vm.screen(quiz_loop.clock().now()));
    play_current(&quiz_loop, &mut vm, &mut gate).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading input")? else {
                    break;
                };
                match parse_line(&line) {
                    Input::Intent(intent) => {
                        debouncer.cancel();
                        apply_intent(&quiz_loop, &mut vm, &mut gate, intent).await?;
                    }
                    Input::Toggle => match gate.toggle() {
                        Ok(_) => {}
                        Err(err) => println!("{err}"),
                    },
                    Input::Suggest(query) => {
                        debouncer.request(&query);
                    }
                    Input::Status => {
                        render_progress(*gate.elapsed().borrow(), vm.session().attempt_duration());
                    }
                    Input::Help => println!("{HELP}"),
                    Input::Quit => break,
                    Input::Unknown(command) => println!("Nepoznata naredba :{command}"),
                }
            }
            Some(event) = playback_rx.recv() => {
                if gate.handle(event) {
                    tracing::debug!("preview window ended");
                }
            }
            Some(event) = suggestion_rx.recv() => {
                if !debouncer.is_current(&event) {
                    continue;
                }
                let suggestions = match event {
                    SuggestionEvent::Local { query, .. } => vm.suggestions(&query),
                    SuggestionEvent::Remote { suggestions, .. } => suggestions,
                };
                render_suggestions(&suggestions);
            }
            _ = cooldown_tick.tick() => {
                if quiz_loop.poll_cooldown(vm.session_mut()).await.context("saving progress")? {
                    println!("Nove pjesme su dostupne!");
                    render(&vm.screen(quiz_loop.clock().now()));
                    play_current(&quiz_loop, &mut vm, &mut gate).await?;
                }
            }
            _ = day_tick.tick() => {
                if quiz_loop.poll_day_change(vm.session_mut()).await.context("saving progress")? {
                    println!("Novi dan, nove pjesme!");
                    render(&vm.screen(quiz_loop.clock().now()));
                    play_current(&quiz_loop, &mut vm, &mut gate).await?;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    gate.freeze();
    Ok(())
}
