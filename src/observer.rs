//! Score/lives/timer change notification
//!
//! The engine broadcasts after anything that can move the score, the
//! player's lives or the clock. Notifications carry no payload; observers
//! read the current values back through `Subject`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::consts::FRAMES_PER_SECOND;

/// Read side exposed to observers during a broadcast
pub trait Subject {
    fn points(&self) -> u32;
    fn lives(&self) -> i32;
    /// Frames elapsed while the player was alive
    fn timer(&self) -> u32;
}

pub trait Observer {
    fn update(&mut self, subject: &dyn Subject);
}

/// Shared observers stay readable by whoever attached them
impl<T: Observer> Observer for Rc<RefCell<T>> {
    fn update(&mut self, subject: &dyn Subject) {
        self.borrow_mut().update(subject);
    }
}

/// Handle returned by `attach`, used to detach later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

/// Attached observers, notified in attachment order
#[derive(Default)]
pub struct ObserverList {
    next_id: u32,
    entries: Vec<(ObserverId, Box<dyn Observer>)>,
}

impl std::fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("attached", &self.entries.len())
            .finish()
    }
}

impl ObserverList {
    pub fn attach(&mut self, observer: Box<dyn Observer>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    pub fn detach(&mut self, id: ObserverId) -> Option<Box<dyn Observer>> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(index).1)
    }

    pub fn notify(&mut self, subject: &dyn Subject) {
        for (_, observer) in &mut self.entries {
            observer.update(subject);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Observer mirroring the HUD values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub points: u32,
    pub lives: i32,
    pub timer: u32,
    /// Number of notifications received
    pub updates: u32,
}

impl Observer for Scoreboard {
    fn update(&mut self, subject: &dyn Subject) {
        self.points = subject.points();
        self.lives = subject.lives();
        self.timer = subject.timer();
        self.updates += 1;
    }
}

impl Scoreboard {
    pub fn hud_line(&self) -> String {
        format!(
            "LIVES: {}  SCORE: {}  TIME: {}",
            self.lives,
            self.points,
            format_time(self.timer)
        )
    }
}

/// Format a frame count as `m:ss`
pub fn format_time(frames: u32) -> String {
    let seconds = frames / FRAMES_PER_SECOND;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u32, i32, u32);

    impl Subject for Fixed {
        fn points(&self) -> u32 {
            self.0
        }
        fn lives(&self) -> i32 {
            self.1
        }
        fn timer(&self) -> u32 {
            self.2
        }
    }

    struct Log {
        name: &'static str,
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Observer for Log {
        fn update(&mut self, _subject: &dyn Subject) {
            self.calls.borrow_mut().push(self.name);
        }
    }

    #[test]
    fn test_notify_in_attachment_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut list = ObserverList::default();
        for name in ["first", "second", "third"] {
            list.attach(Box::new(Log {
                name,
                calls: calls.clone(),
            }));
        }
        list.notify(&Fixed(0, 3, 0));
        assert_eq!(*calls.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_detach_stops_notifications() {
        let board = Rc::new(RefCell::new(Scoreboard::default()));
        let mut list = ObserverList::default();
        let id = list.attach(Box::new(board.clone()));

        list.notify(&Fixed(5, 2, 240));
        assert_eq!(board.borrow().points, 5);
        assert_eq!(board.borrow().lives, 2);

        assert!(list.detach(id).is_some());
        assert!(list.detach(id).is_none());
        list.notify(&Fixed(9, 1, 300));
        assert_eq!(board.borrow().points, 5);
        assert_eq!(board.borrow().updates, 1);
        assert!(list.is_empty());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(FRAMES_PER_SECOND * 5), "0:05");
        assert_eq!(format_time(FRAMES_PER_SECOND * 125 + 7), "2:05");
    }

    #[test]
    fn test_hud_line() {
        let board = Scoreboard {
            points: 12,
            lives: 3,
            timer: FRAMES_PER_SECOND * 61,
            updates: 1,
        };
        assert_eq!(board.hud_line(), "LIVES: 3  SCORE: 12  TIME: 1:01");
    }
}
