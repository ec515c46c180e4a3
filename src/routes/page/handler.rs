use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    AppState,
    access::{
        self, AUTHENTICATION_PATH, DASHBOARD_PATH, DashboardView, GateOutcome, SIGN_OUT_FAILED,
        SIGN_OUT_FAILED_NOTICE,
    },
    error::AppError,
    utils::escape_html,
};

const AUTHENTICATION_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
  <main>
    <section>
      <h1>Sign in</h1>
      <form data-endpoint="/authentication/login">
        <input name="email" type="email" placeholder="Email">
        <input name="password" type="password" placeholder="Password">
        <button type="submit">Sign in</button>
      </form>
    </section>
    <section>
      <h1>Create account</h1>
      <form data-endpoint="/authentication/sign-up">
        <input name="name" placeholder="Name">
        <input name="email" type="email" placeholder="Email">
        <input name="password" type="password" placeholder="Password">
        <input name="confirm_password" type="password" placeholder="Confirm password">
        <button type="submit">Create account</button>
      </form>
    </section>
    <p id="notification" role="status"></p>
  </main>
  <script>
    for (const form of document.querySelectorAll("form[data-endpoint]")) {
      form.addEventListener("submit", async (event) => {
        event.preventDefault();
        const button = form.querySelector("button");
        button.disabled = true;
        try {
          const body = Object.fromEntries(new FormData(form));
          const res = await fetch(form.dataset.endpoint, {
            method: "POST",
            headers: { "Content-Type": "application/json" },
            body: JSON.stringify(body),
          });
          const json = await res.json();
          const data = json.resp_data || {};
          if (data.notification) {
            document.getElementById("notification").textContent = data.notification.message;
          }
          if (data.errors && data.errors.length) {
            document.getElementById("notification").textContent =
              data.errors.map((e) => e.field + ": " + e.message).join(", ");
          }
          if (data.redirect) {
            window.location.assign(data.redirect);
          }
        } finally {
          button.disabled = false;
        }
      });
    }
  </script>
</body>
</html>
"#;

const CLINIC_FORM_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Add clinic</title></head>
<body>
  <main>
    <h1>Add clinic</h1>
    <p>Create your clinic to get started.</p>
    <form id="clinic-form">
      <input name="name" placeholder="Clinic name">
      <button type="submit">Create clinic</button>
    </form>
    <p id="notification" role="status"></p>
  </main>
  <script>
    document.getElementById("clinic-form").addEventListener("submit", async (event) => {
      event.preventDefault();
      const body = Object.fromEntries(new FormData(event.target));
      const res = await fetch("/clinics", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body),
      });
      if (res.ok) {
        window.location.assign("/dashboard");
      } else {
        const json = await res.json();
        document.getElementById("notification").textContent = json.msg;
      }
    });
  </script>
</body>
</html>
"#;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub notice: Option<String>,
}

impl DashboardQuery {
    /// 只接受已知的通知，查询参数本身不会进入页面
    fn notification(&self) -> Option<&'static str> {
        match self.notice.as_deref() {
            Some(SIGN_OUT_FAILED_NOTICE) => Some(SIGN_OUT_FAILED),
            _ => None,
        }
    }
}

fn render_dashboard(view: &DashboardView, notification: Option<&str>) -> String {
    let notice = notification
        .map(|message| {
            format!(
                r#"<p id="notification" class="notification error" role="alert">{}</p>"#,
                escape_html(message)
            )
        })
        .unwrap_or_default();
    let avatar = view
        .image
        .as_deref()
        .map(|src| format!(r#"<img src="{}" alt="">"#, escape_html(src)))
        .unwrap_or_default();

    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Dashboard</title></head>
<body>
  {notice}
  <header>
    {avatar}
    <h1>Dashboard</h1>
    <p class="user-name">{name}</p>
    <p class="user-email">{email}</p>
    <form method="post" action="{action}">
      <button type="submit">Sign out</button>
    </form>
  </header>
</body>
</html>
"#,
        notice = notice,
        avatar = avatar,
        name = escape_html(&view.name),
        email = escape_html(&view.email),
        action = view.sign_out_action,
    )
}

pub async fn index() -> Redirect {
    Redirect::to(DASHBOARD_PATH)
}

pub async fn authentication() -> Html<&'static str> {
    Html(AUTHENTICATION_PAGE)
}

#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let outcome = access::evaluate(
        state.sessions.as_ref(),
        state.memberships.as_ref(),
        &headers,
    )
    .await?;

    Ok(match outcome {
        GateOutcome::Redirect(path) => Redirect::to(path).into_response(),
        GateOutcome::Render(view) => {
            Html(render_dashboard(&view, query.notification())).into_response()
        }
    })
}

#[axum::debug_handler]
pub async fn clinic_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match access::resolve_session(state.sessions.as_ref(), &headers).await {
        Some(_) => Html(CLINIC_FORM_PAGE).into_response(),
        None => Redirect::to(AUTHENTICATION_PATH).into_response(),
    }
}
