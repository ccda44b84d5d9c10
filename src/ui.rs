use std::cell::RefCell;

use anyhow::Result;
use colored::Colorize;

use calc::Calculation;
use param::{Param, ViewHandle};
use util::Timer;

use crate::settings::Settings;

/// Width of the progress bar, in characters.
const BAR_WIDTH: usize = 30;

/// All interactions with the text UI should go through this struct.
pub struct Ui {
    /// -v setting, displays extra text info to user
    pub verbose: bool,
    /// -y setting, ignores all points where the user is prompted to enter 'y'
    override_confirmation: bool,
    /// keeps track of time for each step
    timer: Timer,
    /// buffer to hold strings internally when getting input
    strbuf: RefCell<String>,
}

impl Ui {
    pub fn new(settings: &Settings) -> Self {
        Self {
            verbose: settings.verbose > 0,
            override_confirmation: settings.yes,
            timer: Timer::now(),
            // Refcell so we can call confirm() w/o needing a unique reference:
            strbuf: RefCell::new(String::with_capacity(16)),
        }
    }

    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.override_confirmation {
            return Ok(true);
        }
        eprintln!("{} (y/N)", prompt);

        let mut strbuf = self.strbuf.borrow_mut();

        strbuf.clear();
        std::io::stdin().read_line(&mut strbuf)?;
        match strbuf.chars().next() {
            Some('y') => Ok(true),
            _ => Ok(false),
        }
    }

    pub fn start_timer(&mut self) {
        if self.verbose {
            self.timer.reset();
        }
    }

    pub fn print_elapsed(&self, task: &str) {
        if self.verbose {
            self.timer.print_elapsed(task);
        }
    }

    pub fn verbose_msg(&self, msg: &str) {
        if self.verbose {
            eprintln!("{}", msg);
        }
    }

    pub fn verbose_progress(&self, msg: &str) {
        if self.verbose {
            eprint!("{}... ", msg.magenta());
        }
    }

    pub fn verbose_progress_debug<T: std::fmt::Debug>(&self, msg: &str, arg: T) {
        if self.verbose {
            eprint!("{} {:?}... ", msg.magenta(), arg);
        }
    }

    pub fn done(&self) {
        if self.verbose {
            eprintln!("{}.", "done".green());
        }
    }

    /// Print the input views of every visible parameter under `root`.
    pub fn print_inputs(&self, title: &str, root: &Param) {
        eprintln!("{}", title.cyan());
        print_views(root, Param::input_view);
    }

    /// Print the output views of every visible parameter under `root`.
    pub fn print_outputs(&self, title: &str, root: &Param) {
        eprintln!("{}", title.cyan());
        print_views(root, Param::output_view);
    }
}

fn print_views(root: &Param, view: fn(&Param) -> ViewHandle) {
    // the root collection is just a container; start with its children:
    root.walk_visible(&mut |p, depth| {
        if depth > 0 {
            let indent = "  ".repeat(depth);
            eprintln!("{indent}{}", view(p).borrow().render());
        }
    });
}

/// One line of progress output for a running calculation.
pub fn progress_line(calc: &Calculation) -> String {
    let units = calc.units();
    let progress = units.progress();
    let filled = (progress * BAR_WIDTH as f64).round() as usize;
    format!(
        "{} [{}{}] {:>3}% ({}/{})",
        calc.label(),
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
        (progress * 100.0).round() as u32,
        units.completed,
        units.total,
    )
}
