use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::channel::oneshot;
use futures::future::{Fuse, FutureExt};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use web_sys::{Document, KeyboardEvent};

use chatwidget_core::{
    ChatMessage, ChatWidget, Connection, OutgoingEvent, RequestKind, Retry, SessionAction,
    SpeechAnnouncer, SpeechEngine, WidgetConfig, WidgetError,
};

use crate::dom;
use crate::markdown;
use crate::socket::{Closed, SocketIoConnection};
use crate::speech::{AlertNotifier, WebSpeechEngine};
use crate::utils;

const MESSAGES: &str = "messagesContainer";
const MESSAGE_INPUT: &str = "messageInput";
const SEND_BUTTON: &str = "sendButton";
const IMAGE_INPUT: &str = "imagePromptInput";
const IMAGE_BUTTON: &str = "generateImageButton";
const IMAGE: &str = "generatedImage";
const IMAGE_SECTION: &str = "generatedImageSection";
const LOADING: &str = "loadingIndicator";
const STATUS: &str = "connectionStatus";

pub struct ChatWidgetApp {
    config: WidgetConfig,
    document: Document,
    state: Rc<RefCell<UiState>>,
    outgoing: UnboundedReceiver<OutgoingEvent>,
    shutdown: Fuse<oneshot::Receiver<()>>,
    shutdown_tx: Rc<RefCell<Option<oneshot::Sender<()>>>>,
}

struct UiState {
    widget: ChatWidget,
    connection: Connection,
    markdown_enabled: bool,
    /// Messages already appended to the container
    rendered: usize,
}

impl ChatWidgetApp {
    pub fn new(config: WidgetConfig) -> Result<Self, JsValue> {
        let document = crate::document()?;

        let engine = WebSpeechEngine::detect().map(|e| Box::new(e) as Box<dyn SpeechEngine>);
        let announcer = SpeechAnnouncer::new(engine, Box::new(AlertNotifier), config.speech.clone());

        let (tx, outgoing) = mpsc::unbounded();
        let widget = ChatWidget::new(config.user_id, Box::new(tx), announcer);

        let state = UiState {
            widget,
            connection: Connection::new(config.reconnect.clone()),
            markdown_enabled: config.markdown,
            rendered: 0,
        };

        let (shutdown_tx, shutdown) = oneshot::channel();

        Ok(Self {
            config,
            document,
            state: Rc::new(RefCell::new(state)),
            outgoing,
            shutdown: shutdown.fuse(),
            shutdown_tx: Rc::new(RefCell::new(Some(shutdown_tx))),
        })
    }

    pub async fn start(mut self) -> Result<(), JsValue> {
        self.setup_message_input()?;
        self.setup_image_input()?;
        self.setup_teardown()?;
        render(&self.document, &mut self.state.borrow_mut())?;

        let url = self
            .config
            .socket_url()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        loop {
            if !self.state.borrow().widget.is_mounted() {
                return Ok(());
            }

            self.state.borrow_mut().connection.begin_connect();
            render(&self.document, &mut self.state.borrow_mut())?;

            let outcome = match SocketIoConnection::open(&url, &self.config.namespace) {
                Ok(conn) => {
                    let document = self.document.clone();
                    let state = self.state.clone();
                    conn.run(&mut self.outgoing, &mut self.shutdown, move |action| {
                        if let Err(e) = handle_action(&document, &state, action) {
                            log::error!("Failed to apply socket action: {:?}", e);
                        }
                    })
                    .await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(Closed::Shutdown) => {
                    log::info!("WebSocket closed normally");
                    self.state.borrow_mut().connection.closed();
                    return Ok(());
                }
                Ok(Closed::ByServer) => {
                    self.state.borrow_mut().connection.closed();
                    render(&self.document, &mut self.state.borrow_mut())?;
                    self.show_system_message("Disconnected by server.")?;
                    return Ok(());
                }
                Ok(Closed::Refused(message)) => {
                    self.state.borrow_mut().connection.closed();
                    render(&self.document, &mut self.state.borrow_mut())?;
                    self.show_error(&format!("Connection refused: {}", message))?;
                    return Ok(());
                }
                Err(e) => {
                    log::error!("WebSocket error: {:?}", e);
                    let retry = self.state.borrow_mut().connection.failed();
                    render(&self.document, &mut self.state.borrow_mut())?;

                    match retry {
                        Retry::After(delay) => {
                            log::info!("Retrying in {}ms...", delay.as_millis());
                            let _ = self.show_system_message(&format!(
                                "Connection lost. Retrying in {}s...",
                                delay.as_secs()
                            ));
                            gloo_timers::future::TimeoutFuture::new(utils::timer_millis(delay)).await;
                        }
                        Retry::GiveUp => {
                            self.show_error("Connection failed after multiple retries. Please refresh the page.")?;
                            return Err(JsValue::from_str("Max retries exceeded"));
                        }
                    }
                }
            }
        }
    }

    fn setup_message_input(&self) -> Result<(), JsValue> {
        let input = dom::get_input_by_id(&self.document, MESSAGE_INPUT)?;
        let state = self.state.clone();
        let input_clone = input.clone();
        dom::add_listener(&input, "input", move |_: web_sys::Event| {
            state.borrow_mut().widget.set_message_draft(input_clone.value());
        })?;

        let state = self.state.clone();
        let document = self.document.clone();
        dom::add_listener(&input, "keydown", move |event: KeyboardEvent| {
            if event.key() == "Enter" && !event.shift_key() {
                event.prevent_default();
                submit(&document, &state, RequestKind::Chat);
            }
        })?;

        let button = dom::get_button_by_id(&self.document, SEND_BUTTON)?;
        let state = self.state.clone();
        let document = self.document.clone();
        dom::add_listener(&button, "click", move |_: web_sys::Event| {
            submit(&document, &state, RequestKind::Chat);
        })?;

        Ok(())
    }

    fn setup_image_input(&self) -> Result<(), JsValue> {
        let input = dom::get_input_by_id(&self.document, IMAGE_INPUT)?;
        let state = self.state.clone();
        let input_clone = input.clone();
        dom::add_listener(&input, "input", move |_: web_sys::Event| {
            state.borrow_mut().widget.set_image_draft(input_clone.value());
        })?;

        let button = dom::get_button_by_id(&self.document, IMAGE_BUTTON)?;
        let state = self.state.clone();
        let document = self.document.clone();
        dom::add_listener(&button, "click", move |_: web_sys::Event| {
            submit(&document, &state, RequestKind::Image);
        })?;

        Ok(())
    }

    /// Unmount when the page goes away
    fn setup_teardown(&self) -> Result<(), JsValue> {
        let window = crate::window()?;
        let state = self.state.clone();
        let shutdown_tx = self.shutdown_tx.clone();
        dom::add_listener(&window, "pagehide", move |_: web_sys::Event| {
            state.borrow_mut().widget.unmount();
            if let Some(tx) = shutdown_tx.borrow_mut().take() {
                let _ = tx.send(());
            }
        })
    }

    fn show_error(&self, message: &str) -> Result<(), JsValue> {
        let container = dom::get_element_by_id(&self.document, MESSAGES)?;

        let error_div = dom::create_element_with_class(&self.document, "div", "message error")?;
        let html = format!(
            r#"<div class="error-icon">⚠️</div><div class="error-message">{}</div>"#,
            utils::escape_html(message)
        );
        error_div.set_inner_html(&html);
        container.append_child(&error_div)?;

        dom::scroll_to_bottom(&container);
        Ok(())
    }

    fn show_system_message(&self, message: &str) -> Result<(), JsValue> {
        let container = dom::get_element_by_id(&self.document, MESSAGES)?;

        let msg_div = dom::create_element_with_class(&self.document, "div", "message system")?;
        msg_div.set_text_content(Some(message));
        container.append_child(&msg_div)?;

        dom::scroll_to_bottom(&container);
        Ok(())
    }
}

fn submit(document: &Document, state: &Rc<RefCell<UiState>>, kind: RequestKind) {
    let mut s = state.borrow_mut();
    if !s.connection.can_submit() {
        log::warn!("Not connected, ignoring {} submit", kind);
        return;
    }

    let result = match kind {
        RequestKind::Chat => s.widget.submit_message_draft(),
        RequestKind::Image => s.widget.submit_image_draft(),
    };
    match result {
        Ok(id) => log::debug!("Submitted {} request {}", kind, id),
        Err(WidgetError::EmptyInput) => {}
        Err(e) => log::warn!("Submit rejected: {}", e),
    }

    if let Err(e) = render(document, &mut s) {
        log::error!("Failed to render: {:?}", e);
    }
}

fn handle_action(
    document: &Document,
    state: &Rc<RefCell<UiState>>,
    action: SessionAction,
) -> Result<(), JsValue> {
    let mut s = state.borrow_mut();
    match action {
        SessionAction::Connected { sid } => {
            log::info!("Socket connected, sid={}", sid.as_deref().unwrap_or("?"));
            s.connection.connected();
        }
        SessionAction::Event(event) => {
            let name = event.name();
            if let Err(e) = s.widget.handle_incoming(event) {
                log::warn!("Ignoring {}: {}", name, e);
            }
        }
        SessionAction::Disconnected => log::info!("Socket disconnected by server"),
        SessionAction::ConnectError(message) => log::error!("Socket connect error: {}", message),
        SessionAction::Send(_) => {}
    }
    render(document, &mut s)
}

/// Bring the DOM in line with the widget state
fn render(document: &Document, state: &mut UiState) -> Result<(), JsValue> {
    let container = dom::get_element_by_id(document, MESSAGES)?;
    let messages = state.widget.messages();
    if state.rendered < messages.len() {
        for message in &messages[state.rendered..] {
            render_message(document, &container, message, state.markdown_enabled)?;
        }
        state.rendered = messages.len();
        dom::scroll_to_bottom(&container);
    }

    let loading = dom::get_html_element_by_id(document, LOADING)?;
    if state.widget.is_loading() {
        dom::show_element(&loading);
    } else {
        dom::hide_element(&loading);
    }

    let connected = state.connection.can_submit();

    let send = dom::get_button_by_id(document, SEND_BUTTON)?;
    send.set_disabled(!(connected && state.widget.can_submit(RequestKind::Chat)));
    send.set_text_content(Some(utils::send_button_label(state.widget.is_pending(RequestKind::Chat))));

    let generate = dom::get_button_by_id(document, IMAGE_BUTTON)?;
    generate.set_disabled(!(connected && state.widget.can_submit(RequestKind::Image)));
    generate.set_text_content(Some(utils::image_button_label(state.widget.is_pending(RequestKind::Image))));

    // submitted drafts are cleared in the widget
    let input = dom::get_input_by_id(document, MESSAGE_INPUT)?;
    if input.value() != state.widget.message_draft() {
        input.set_value(state.widget.message_draft());
    }
    let input = dom::get_input_by_id(document, IMAGE_INPUT)?;
    if input.value() != state.widget.image_draft() {
        input.set_value(state.widget.image_draft());
    }

    let section = dom::get_html_element_by_id(document, IMAGE_SECTION)?;
    match state.widget.image_url() {
        Some(url) => {
            let image = dom::get_image_by_id(document, IMAGE)?;
            if image.src() != url {
                image.set_src(url);
            }
            dom::show_element(&section);
        }
        None => dom::hide_element(&section),
    }

    if let Ok(status) = dom::get_element_by_id(document, STATUS) {
        status.set_text_content(Some(&state.connection.state().to_string()));
    }

    Ok(())
}

fn render_message(
    document: &Document,
    container: &web_sys::Element,
    message: &ChatMessage,
    markdown_enabled: bool,
) -> Result<(), JsValue> {
    let msg_div = dom::create_element_with_class(document, "div", "message exchange")?;

    let markdown_class = if markdown_enabled { " markdown" } else { "" };
    let html = format!(
        r#"<div class="message-role">You:</div><div class="message-content user">{}</div><div class="message-role">Bot:</div><div class="message-content reply{}">{}</div>"#,
        utils::escape_html(&message.text).replace('\n', "<br>"),
        markdown_class,
        markdown::render_reply(&message.reply, markdown_enabled)
    );
    msg_div.set_inner_html(&html);
    container.append_child(&msg_div)?;
    Ok(())
}
