use super::{MessageContent, Rendered, Widget, WidgetContext, WidgetResult};

/// Try `primary`, falling back to `secondary` when it rejects.
///
/// Renders the primary's layout with the secondary's prompt appended, so a
/// contact button and a "or type it" hint can share one field.
pub struct Either {
    primary: Box<dyn Widget>,
    secondary: Box<dyn Widget>,
}

impl Either {
    pub fn new(primary: impl Widget, secondary: impl Widget) -> Self {
        Self {
            primary: Box::new(primary),
            secondary: Box::new(secondary),
        }
    }
}

impl std::fmt::Debug for Either {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Either")
            .field("primary", &self.primary.kind())
            .field("secondary", &self.secondary.kind())
            .finish()
    }
}

impl Widget for Either {
    fn kind(&self) -> &'static str {
        "either"
    }

    fn prompt(&self) -> &str {
        self.primary.prompt()
    }

    fn needs_callback(&self) -> bool {
        self.primary.needs_callback() || self.secondary.needs_callback()
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let mut rendered = self.primary.render(ctx);
        let hint = self.secondary.prompt();
        if !hint.is_empty() {
            rendered.text = format!("{}\n\n{hint}", rendered.text);
        }
        rendered
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        match self.primary.handle_callback(data, ctx) {
            WidgetResult::Reject { .. } => self.secondary.handle_callback(data, ctx),
            other => other,
        }
    }

    fn handle_message(&self, content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        match self.primary.handle_message(content, ctx) {
            WidgetResult::Reject { .. } => self.secondary.handle_message(content, ctx),
            other => other,
        }
    }

    fn depends_on(&self) -> Vec<&str> {
        let mut deps = self.primary.depends_on();
        for dep in self.secondary.depends_on() {
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        deps
    }

    fn uses_dynamic_options(&self) -> bool {
        self.primary.uses_dynamic_options() || self.secondary.uses_dynamic_options()
    }
}
