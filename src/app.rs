use std::{collections::VecDeque, time::Duration};

use eframe::egui;
use log::{error, info, warn};

use crate::{
    cli::Options,
    error::RunError,
    injector::{EnigoInjector, Injector, InjectorOptions},
    runner::{ActionRunner, RunOutcome, RunStatus},
    target::{PrimaryAction, RunConfig, SecondaryAction, Target, TargetForm},
};

const POSITION_REFRESH: Duration = Duration::from_millis(100);
const MAX_MESSAGES: usize = 50;

/// User-visible messages, oldest dropped first.
#[derive(Debug, Default)]
struct MessageLog(VecDeque<String>);

impl MessageLog {
    fn push(&mut self, message: impl Into<String>) {
        if self.0.len() == MAX_MESSAGES {
            self.0.pop_front();
        }
        self.0.push_back(message.into());
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Reads the form for a new run. An active run wins over whatever the form now holds.
pub fn prepare_start(runner: &ActionRunner, form: &TargetForm) -> Result<(Vec<Target>, RunConfig), RunError> {
    if runner.is_running() {
        info!("Info: Script is already running.");
        return Err(RunError::AlreadyRunning);
    }
    Ok(form.build()?)
}

// -------------- UI State --------------
pub struct AppState {
    form: TargetForm,
    runner: ActionRunner,
    injector_options: InjectorOptions,
    /// Used only for the live position readout.
    pointer: EnigoInjector,
    messages: MessageLog,
}

impl AppState {
    pub fn new(opts: &Options) -> Self {
        let injector_options = opts.injector_options();
        Self {
            form: TargetForm::new(opts.locations as usize, opts.cycle_wait, opts.click_wait),
            runner: ActionRunner::new(Some(opts.stop_key), opts.move_duration),
            injector_options,
            pointer: EnigoInjector::new(injector_options),
            messages: MessageLog::default(),
        }
    }

    fn report(&mut self, message: impl Into<String>) {
        self.messages.push(message);
    }

    fn set_location_count(&mut self) {
        match self.form.apply_location_count() {
            Ok(n) => info!("Form now has {n} location(s)."),
            Err(e) => {
                warn!("Input Error: {e}");
                self.report(format!("Input Error: {e}"));
            }
        }
    }

    fn start(&mut self) {
        let result = prepare_start(&self.runner, &self.form).and_then(|(targets, config)| {
            let injector: Box<dyn Injector> = Box::new(EnigoInjector::new(self.injector_options));
            self.runner.start(targets, config, injector)
        });

        match result {
            Ok(()) => self.report("Mouse actions started."),
            Err(RunError::AlreadyRunning) => self.report("Info: Script is already running."),
            Err(RunError::Validation(e)) => {
                warn!("Input Error: {e}");
                self.report(format!("Input Error: {e}"));
            }
            Err(e) => {
                error!("{e}");
                self.report(format!("Error: {e}"));
            }
        }
    }

    fn stop(&mut self) {
        self.runner.request_stop();
        self.report("Attempting to stop script. Please wait a moment.");
    }

    fn collect_outcome(&mut self) {
        match self.runner.take_finished() {
            Some(RunOutcome::Stopped { cycles }) => {
                self.report(format!("Script stopped after {cycles} full cycle(s)."))
            }
            Some(RunOutcome::Failed(e)) => self.report(format!("Script terminated: {e}")),
            None => {}
        }
    }

    fn location_rows(&mut self, ui: &mut egui::Ui) {
        for (i, row) in self.form.rows.iter_mut().enumerate() {
            ui.horizontal(|ui| {
                ui.label(format!("Location {}:", i + 1));
                ui.add(egui::TextEdit::singleline(&mut row.coords).hint_text("x, y").desired_width(110.0));

                let mut primary = row.primary;
                egui::ComboBox::from_id_source(("primary", i))
                    .selected_text(primary.label())
                    .width(110.0)
                    .show_ui(ui, |ui| {
                        for action in PrimaryAction::ALL {
                            ui.selectable_value(&mut primary, action, action.label());
                        }
                    });
                if primary != row.primary {
                    row.set_primary(primary);
                }

                if row.primary == PrimaryAction::DoubleClick {
                    egui::ComboBox::from_id_source(("secondary", i))
                        .selected_text(row.secondary.label())
                        .width(80.0)
                        .show_ui(ui, |ui| {
                            for action in SecondaryAction::ALL {
                                ui.selectable_value(&mut row.secondary, action, action.label());
                            }
                        });
                }
            });
        }
    }
}

impl eframe::App for AppState {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.collect_outcome();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            let (x, y) = self.pointer.position();
            ui.heading(format!("Current Mouse Position: X={x}, Y={y}"));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Number of Locations (1-10):");
                ui.add(egui::TextEdit::singleline(&mut self.form.location_count).desired_width(40.0));
                if ui.button("Set").clicked() {
                    self.set_location_count();
                }
            });

            ui.separator();
            ui.group(|ui| {
                ui.label(egui::RichText::new("Enter Coordinates (x, y) & Action:").strong());
                self.location_rows(ui);
            });

            ui.separator();
            ui.horizontal(|ui| {
                ui.label("Cycle Wait Time (seconds):");
                ui.add(egui::TextEdit::singleline(&mut self.form.cycle_wait).desired_width(60.0));
            });
            ui.horizontal(|ui| {
                ui.label("Click Wait Time (seconds):");
                ui.add(egui::TextEdit::singleline(&mut self.form.click_wait).desired_width(60.0));
            });

            ui.horizontal(|ui| {
                if ui.button("Start Script").clicked() {
                    self.start();
                }
                if ui.button("Stop Script").clicked() {
                    self.stop();
                }
            });

            let status = match self.runner.status() {
                RunStatus::Idle => "Idle".to_string(),
                RunStatus::Running => "Running".to_string(),
                RunStatus::Stopped { cycles } => format!("Stopped ({cycles} cycles)"),
                RunStatus::Failed(reason) => format!("Failed: {reason}"),
            };
            ui.label(format!("Status: {status}"));

            ui.separator();
            egui::ScrollArea::vertical().stick_to_bottom(true).show(ui, |ui| {
                for message in self.messages.iter() {
                    ui.monospace(message);
                }
            });
        });

        ctx.request_repaint_after(POSITION_REFRESH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_log_is_bounded() {
        let mut log = MessageLog::default();
        for i in 0..(MAX_MESSAGES + 5) {
            log.push(format!("message {i}"));
        }
        assert_eq!(log.iter().count(), MAX_MESSAGES);
        assert_eq!(log.iter().next(), Some("message 5"));
        assert_eq!(log.iter().last(), Some("message 54"));
    }
}
