// Built-in page sources. `{{NAME}}` marks a slot filled by `Template::render`.

pub const INDEX_PAGE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>DropGo</title>
  <style>
    body { font-family: -apple-system, Arial; padding: 16px; max-width: 720px; margin: 0 auto; }
    h1 { margin: 8px 0 16px; }
    .card { padding: 12px; border: 1px solid #eee; border-radius: 12px; margin: 12px 0; }
    .btn { padding: 10px 14px; border-radius: 10px; border: 0; background: #1677ff; color: #fff; }
    .btn2 { padding: 8px 10px; border-radius: 10px; border: 1px solid #ddd; background: #fff; }
    .row { display:flex; gap: 8px; align-items:center; flex-wrap: wrap; }
    input[type=file]{ max-width: 100%; }
    a { color:#1677ff; text-decoration:none; }
    small { color:#666; }
  </style>
</head>
<body>
  <h1>DropGo</h1>
  <div class="card">
    <h3 style="margin-top:0">Вход с мобильного устройства</h3>
    <p><a href="{{SHARE_URL}}">{{SHARE_URL}}</a></p>
    <img src="/qr.png" width="220" alt="QR" style="border-radius:12px; border:1px solid #eee;">
    <p><small>Сканируй камерой iPhone/Android и сразу открывай сайт!</small></p>
  </div>
  <div class="card">
    <form enctype="multipart/form-data" action="/upload" method="post">
      <div class="row">
        <input type="file" name="file" required />
        <button class="btn" type="submit">Загрузить</button>
      </div>
    </form>
    {{MESSAGE}}
  </div>
  <div class="row" style="margin-top:10px">
    <a class="btn2" href="/gallery">Открыть галерею</a>
  </div>
  <div class="card">
    <h3 style="margin-top:0">Файлы ({{FILE_COUNT}})</h3>
    {{FILES}}
  </div>
</body>
</html>
"#;

pub const GALLERY_PAGE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>DropGo — Галерея</title>
  <style>
    body { font-family: -apple-system, Arial; padding: 16px; max-width: 900px; margin: 0 auto; }
    a { color:#1677ff; text-decoration:none; }
    .top { display:flex; justify-content:space-between; align-items:center; gap:12px; flex-wrap:wrap; }
    .grid { display:grid; grid-template-columns: repeat(auto-fill, minmax(140px, 1fr)); gap: 12px; margin-top: 16px; }
    .item { border:1px solid #eee; border-radius: 12px; overflow:hidden; background:#fff; }
    .item img { width:100%; height:140px; object-fit:cover; display:block; }
    .cap { padding:8px; font-size:12px; color:#333; word-break: break-all; }
  </style>
</head>
<body>
  <div class="top">
    <h2 style="margin:0">Галерея</h2>
    <a href="/">← назад</a>
  </div>
  <div class="grid">{{IMAGES}}</div>
  {{EMPTY}}
</body>
</html>
"#;

pub const MESSAGE: &str = "<p><small>{{MESSAGE}}</small></p>";

pub const FILE_ROW: &str = r#"<li style="margin: 10px 0"><div class="row"><a href="{{VIEW_URL}}">{{NAME}}</a><small>({{SIZE_KB}} KB, {{MODIFIED_AT}})</small><form action="{{DELETE_URL}}" method="post" style="display:inline"><button class="btn2" type="submit">Удалить</button></form></div></li>"#;

pub const GALLERY_CELL: &str = r#"<div class="item"><a href="{{VIEW_URL}}"><img src="{{VIEW_URL}}" alt="{{NAME}}" loading="lazy"></a><div class="cap">{{NAME}}</div></div>"#;

pub const NO_FILES: &str = "<p><small>Пока пусто. Закинь фотку с айфона 🙂</small></p>";

pub const NO_IMAGES: &str = "<p>Пока нет картинок.</p>";
