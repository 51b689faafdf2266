use std::fmt::Display;

/// Write a message to stderr.
///
/// Wraps `eprintln!` so that tests can observe what was printed.
fn print_message(v: impl Display) {
    #[cfg(test)]
    {
        let history = crate::utils::message::history::History::global();
        history.push_message(format!("{v}"));
    }

    eprintln!("{v}");
}

/// alias for [print_message]
pub(crate) fn plain(v: impl Display) {
    print_message(v);
}
pub(crate) fn error(v: impl Display) {
    print_message(std::format_args!("ERROR: {v}"));
}
pub(crate) fn warning(v: impl Display) {
    print_message(std::format_args!("WARNING: {v}"));
}

/// Messages printed through this module, recorded per thread.
///
/// Tests run on separate threads, so a thread local history keeps
/// messages of concurrently running tests apart.
/// Messages printed from other threads, including tasks of a
/// multi-threaded runtime, are not recorded in the test's history.
#[cfg(test)]
pub mod history {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    thread_local! {
        static THREAD_HISTORY: Rc<RefCell<VecDeque<String>>> = {
            Rc::new(RefCell::new(VecDeque::new()))
        };
    }

    pub(crate) struct History {
        messages: Rc<RefCell<VecDeque<String>>>,
    }

    impl History {
        pub(crate) fn global() -> History {
            let messages = THREAD_HISTORY.with(|h| h.clone());
            History { messages }
        }

        /// Snapshot of the messages printed so far, oldest first.
        pub(crate) fn messages(&self) -> VecDeque<String> {
            self.messages.borrow().clone()
        }

        pub(crate) fn push_message(&self, message: String) {
            self.messages.borrow_mut().push_back(message);
        }

        pub(crate) fn clear(&self) {
            self.messages.borrow_mut().clear();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::utils::message::{error, plain, warning};

        #[test]
        fn records_prefixed_messages() {
            plain("loaded");
            warning("slow relay");
            error("relay unreachable");
            assert_eq!(&History::global().messages(), &[
                "loaded",
                "WARNING: slow relay",
                "ERROR: relay unreachable"
            ]);
        }

        #[test]
        fn threads_do_not_share_history() {
            std::thread::scope(|scope| {
                scope.spawn(|| plain("1"));
                scope.spawn(|| plain("2"));
            });

            assert_eq!(History::global().messages().len(), 0)
        }

        #[test]
        fn clear() {
            let history = History::global();

            plain("message");
            assert_eq!(&history.messages(), &["message"]);
            history.clear();
            assert_eq!(history.messages().len(), 0);
        }
    }
}
