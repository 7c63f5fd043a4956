//! Host capabilities.
//!
//! The terminal host is reached through three independent capabilities.
//! [`ConsoleHost`] reports each request on stdout; [`RecordingHost`] keeps
//! them in memory.

use console::style;

use crate::error::LauncherResult;

/// Terminal presentation and connectivity.
pub trait Renderer {
    fn set_renderer(&mut self, name: &str) -> LauncherResult<()>;

    fn set_connection_type(&mut self, kind: &str) -> LauncherResult<()>;

    /// Make the caps key send `key` while `editor` is focused.
    fn set_caps_key(&mut self, editor: &str, key: &str) -> LauncherResult<()>;

    fn set_fonts(&mut self, fonts: &[String]) -> LauncherResult<()>;

    fn set_themes(&mut self, themes: &[String]) -> LauncherResult<()>;

    fn configure_host(&mut self, address: &str, key: &str) -> LauncherResult<()>;

    fn enable_split_view(&mut self) -> LauncherResult<()>;

    /// Hand control to the terminal.
    fn run_terminal(&mut self) -> LauncherResult<()>;
}

/// Settings synchronization across devices.
pub trait SyncProvider {
    fn enable_sync(&mut self) -> LauncherResult<()>;
}

/// Community and feedback entry points.
pub trait FeedbackChannel {
    fn visit_website(&mut self, url: &str) -> LauncherResult<()>;

    fn join_discussion(&mut self) -> LauncherResult<()>;

    fn open_feedback_form(&mut self) -> LauncherResult<()>;

    fn open_feature_request_form(&mut self) -> LauncherResult<()>;

    fn check_for_updates(&mut self) -> LauncherResult<()>;

    fn share_app(&mut self) -> LauncherResult<()>;
}

/// Host that reports every request on the console.
#[derive(Debug, Default)]
pub struct ConsoleHost;

impl ConsoleHost {
    pub fn new() -> Self {
        Self
    }

    fn report(&self, capability: &str, value: impl std::fmt::Display) {
        println!("  {:<12} {}", style(capability).dim(), value);
    }
}

impl Renderer for ConsoleHost {
    fn set_renderer(&mut self, name: &str) -> LauncherResult<()> {
        self.report("renderer", style(name).green());
        Ok(())
    }

    fn set_connection_type(&mut self, kind: &str) -> LauncherResult<()> {
        self.report("connection", style(kind).green());
        Ok(())
    }

    fn set_caps_key(&mut self, editor: &str, key: &str) -> LauncherResult<()> {
        self.report("caps key", format!("{} → {}", style(editor).cyan(), key));
        Ok(())
    }

    fn set_fonts(&mut self, fonts: &[String]) -> LauncherResult<()> {
        self.report("fonts", fonts.join(", "));
        Ok(())
    }

    fn set_themes(&mut self, themes: &[String]) -> LauncherResult<()> {
        self.report("themes", themes.join(", "));
        Ok(())
    }

    fn configure_host(&mut self, address: &str, key: &str) -> LauncherResult<()> {
        self.report("host", format!("{} (key {})", style(address).yellow(), key));
        Ok(())
    }

    fn enable_split_view(&mut self) -> LauncherResult<()> {
        self.report("split view", "enabled");
        Ok(())
    }

    fn run_terminal(&mut self) -> LauncherResult<()> {
        println!("\n{} Terminal ready", style("✓").green().bold());
        Ok(())
    }
}

impl SyncProvider for ConsoleHost {
    fn enable_sync(&mut self) -> LauncherResult<()> {
        self.report("cloud sync", "enabled");
        Ok(())
    }
}

impl FeedbackChannel for ConsoleHost {
    fn visit_website(&mut self, url: &str) -> LauncherResult<()> {
        println!("  Community: {}", style(url).cyan().underlined());
        Ok(())
    }

    fn join_discussion(&mut self) -> LauncherResult<()> {
        println!("  Join the discussion at the community site");
        Ok(())
    }

    fn open_feedback_form(&mut self) -> LauncherResult<()> {
        println!("  Feedback form: open from the community site");
        Ok(())
    }

    fn open_feature_request_form(&mut self) -> LauncherResult<()> {
        println!("  Feature requests: open from the community site");
        Ok(())
    }

    fn check_for_updates(&mut self) -> LauncherResult<()> {
        println!(
            "  Running version {}",
            style(env!("CARGO_PKG_VERSION")).yellow()
        );
        Ok(())
    }

    fn share_app(&mut self) -> LauncherResult<()> {
        println!("  Share Alistaire with a friend");
        Ok(())
    }
}

/// Records every capability request, in order.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub calls: Vec<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, call: String) -> LauncherResult<()> {
        self.calls.push(call);
        Ok(())
    }
}

impl Renderer for RecordingHost {
    fn set_renderer(&mut self, name: &str) -> LauncherResult<()> {
        self.record(format!("renderer:{name}"))
    }

    fn set_connection_type(&mut self, kind: &str) -> LauncherResult<()> {
        self.record(format!("connection:{kind}"))
    }

    fn set_caps_key(&mut self, editor: &str, key: &str) -> LauncherResult<()> {
        self.record(format!("caps_key:{editor}={key}"))
    }

    fn set_fonts(&mut self, fonts: &[String]) -> LauncherResult<()> {
        self.record(format!("fonts:{}", fonts.join(",")))
    }

    fn set_themes(&mut self, themes: &[String]) -> LauncherResult<()> {
        self.record(format!("themes:{}", themes.join(",")))
    }

    fn configure_host(&mut self, address: &str, key: &str) -> LauncherResult<()> {
        self.record(format!("host:{address}:{key}"))
    }

    fn enable_split_view(&mut self) -> LauncherResult<()> {
        self.record("split_view".into())
    }

    fn run_terminal(&mut self) -> LauncherResult<()> {
        self.record("run_terminal".into())
    }
}

impl SyncProvider for RecordingHost {
    fn enable_sync(&mut self) -> LauncherResult<()> {
        self.record("sync".into())
    }
}

impl FeedbackChannel for RecordingHost {
    fn visit_website(&mut self, url: &str) -> LauncherResult<()> {
        self.record(format!("website:{url}"))
    }

    fn join_discussion(&mut self) -> LauncherResult<()> {
        self.record("discussion".into())
    }

    fn open_feedback_form(&mut self) -> LauncherResult<()> {
        self.record("feedback".into())
    }

    fn open_feature_request_form(&mut self) -> LauncherResult<()> {
        self.record("feature_request".into())
    }

    fn check_for_updates(&mut self) -> LauncherResult<()> {
        self.record("updates".into())
    }

    fn share_app(&mut self) -> LauncherResult<()> {
        self.record("share".into())
    }
}
