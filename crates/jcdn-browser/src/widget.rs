//! CodeMirror 5 editor widget.
//!
//! The page loads CodeMirror (with the colorpicker and emmet addons) as a
//! global; this module binds the handful of methods the playground calls.

use jcdn_core::{EditorWidget, KeyCommand, PlaygroundError, Result, WidgetConfig};
use js_sys::{Function, Object, Reflect};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlTextAreaElement;

use crate::js_error_message;

#[wasm_bindgen]
extern "C" {
    /// A CodeMirror editor instance.
    #[derive(Debug, Clone)]
    pub type CodeMirror;

    #[wasm_bindgen(catch, static_method_of = CodeMirror, js_name = fromTextArea)]
    fn from_text_area(
        textarea: &HtmlTextAreaElement,
        options: &JsValue,
    ) -> std::result::Result<CodeMirror, JsValue>;

    #[wasm_bindgen(method, js_name = getValue)]
    pub fn get_value(this: &CodeMirror) -> String;

    #[wasm_bindgen(method, js_name = setValue)]
    pub fn set_value(this: &CodeMirror, value: &str);

    #[wasm_bindgen(method)]
    pub fn focus(this: &CodeMirror);

    #[wasm_bindgen(method)]
    fn on(this: &CodeMirror, event: &str, handler: &Function);
}

/// Change subscription returned by [`CodeMirrorWidget::on_change`]. The
/// handler stays registered as long as this is alive.
pub type ChangeHandler = Closure<dyn FnMut(CodeMirror)>;

#[derive(Debug)]
pub struct CodeMirrorWidget {
    editor: CodeMirror,
    /// Callbacks referenced from `extraKeys`.
    _key_handlers: Vec<Closure<dyn Fn(CodeMirror)>>,
}

impl CodeMirrorWidget {
    pub fn editor(&self) -> &CodeMirror {
        &self.editor
    }

    /// Call `handler` with the full text after every change.
    pub fn on_change(&self, mut handler: impl FnMut(String) + 'static) -> ChangeHandler {
        let closure = Closure::<dyn FnMut(CodeMirror)>::new(move |cm: CodeMirror| {
            handler(cm.get_value());
        });
        self.editor.on("change", closure.as_ref().unchecked_ref());
        closure
    }
}

/// Build the `fromTextArea` options object.
fn widget_options(config: &WidgetConfig) -> Result<(JsValue, Vec<Closure<dyn Fn(CodeMirror)>>)> {
    let options = config
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| PlaygroundError::Widget(e.to_string()))?;

    let extra_keys = Object::new();
    let mut handlers = Vec::new();
    for binding in &config.extra_keys {
        let value: JsValue = match (binding.command, binding.command.widget_command()) {
            (_, Some(command)) => command.into(),
            (KeyCommand::ColorPicker, None) => {
                let handler = Closure::<dyn Fn(CodeMirror)>::new(open_color_picker);
                let function = handler.as_ref().clone();
                handlers.push(handler);
                function
            }
            (KeyCommand::ExpandAbbreviation, None) => continue,
        };
        Reflect::set(&extra_keys, &binding.key.into(), &value)
            .map_err(|e| PlaygroundError::Widget(js_error_message(&e)))?;
    }
    Reflect::set(&options, &"extraKeys".into(), &extra_keys)
        .map_err(|e| PlaygroundError::Widget(js_error_message(&e)))?;

    Ok((options, handlers))
}

/// `cm.state.colorpicker.popup_color_picker()`
fn open_color_picker(cm: CodeMirror) {
    let picker = Reflect::get(&cm, &"state".into())
        .and_then(|state| Reflect::get(&state, &"colorpicker".into()));
    let result = picker.and_then(|picker| {
        let popup = Reflect::get(&picker, &"popup_color_picker".into())?;
        match popup.dyn_ref::<Function>() {
            Some(popup) => popup.call0(&picker).map(|_| ()),
            None => Err(JsValue::from_str("colorpicker addon is not loaded")),
        }
    });
    if let Err(err) = result {
        tracing::debug!(error = %js_error_message(&err), "color picker unavailable");
    }
}

impl EditorWidget for CodeMirrorWidget {
    type Host = HtmlTextAreaElement;

    fn create(host: HtmlTextAreaElement, config: &WidgetConfig) -> Result<Self> {
        let (options, key_handlers) = widget_options(config)?;
        let editor = CodeMirror::from_text_area(&host, &options)
            .map_err(|e| PlaygroundError::Widget(js_error_message(&e)))?;
        Ok(Self {
            editor,
            _key_handlers: key_handlers,
        })
    }

    fn value(&self) -> String {
        self.editor.get_value()
    }

    fn set_value(&mut self, text: &str) {
        self.editor.set_value(text);
    }

    fn focus(&self) {
        self.editor.focus();
    }
}
