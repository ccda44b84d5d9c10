use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use colored::Colorize;

use calc::Calculation;

use crate::ui::progress_line;

/// Run `work` on the current thread while a second thread prints the progress
/// of `calc` every `interval`. The poller only reads counters, so it never
/// blocks the work; it stops as soon as `work` returns.
pub fn watch<T>(calc: &Calculation, interval: Duration, work: impl FnOnce() -> T) -> T {
    let (done, stop) = mpsc::channel::<()>();
    thread::scope(|s| {
        s.spawn(move || poll(calc, interval, stop));
        let result = work();
        drop(done);
        result
    })
}

fn poll(calc: &Calculation, interval: Duration, stop: mpsc::Receiver<()>) {
    let mut last = String::new();
    loop {
        let line = progress_line(calc);
        if line != last {
            eprintln!("{}", line.dimmed());
            last = line;
        }
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    let line = progress_line(calc);
    if line != last {
        eprintln!("{}", line.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_result_is_returned() {
        let calc = Calculation::root("count");
        let total = watch(&calc, Duration::from_millis(1), || {
            calc.set_total_units(50);
            let mut total = 0;
            for i in 0..50 {
                total += i;
                calc.increment();
                thread::sleep(Duration::from_micros(100));
            }
            total
        });
        assert_eq!(total, 1225);
        assert!(calc.is_completed());
    }

    #[test]
    fn test_stops_promptly() {
        let calc = Calculation::root("quick");
        let start = std::time::Instant::now();
        watch(&calc, Duration::from_secs(60), || calc.finish());
        assert!(start.elapsed() < Duration::from_secs(30));
    }
}
