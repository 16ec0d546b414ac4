pub(super) const INDEX_HTML: &str = r#"<!DOCTYPE html>
  <html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
    <title>Imaginary Map</title>
    <link
      rel="stylesheet"
      href="https://unpkg.com/maplibre-gl@4.7.1/dist/maplibre-gl.css"
      crossorigin=""
    />
    <style>
      html, body { height: 100%; margin: 0; padding: 0; }
      #map { height: 100%; width: 100%; }
      #error {
        position: absolute;
        top: 12px;
        left: 12px;
        z-index: 1000;
        background: white;
        padding: 6px;
        border-radius: 4px;
        box-shadow: 0 1px 4px rgba(0,0,0,0.3);
        display: none;
      }
    </style>
  </head>
  <body>
    <div id="error"></div>
    <div id="map"></div>

    <script
      src="https://unpkg.com/maplibre-gl@4.7.1/dist/maplibre-gl.js"
      crossorigin=""
    ></script>

    <script>
      // the server resolves tile templates against this page's directory,
      // so pass our query string (access_token, tile-api) along unchanged
      async function initMap() {
        const res = await fetch(`style.json${window.location.search}`);
        if (!res.ok) {
          const box = document.getElementById('error');
          box.textContent = await res.text();
          box.style.display = 'block';
          return;
        }
        const style = await res.json();

        new maplibregl.Map({
          container: 'map',
          style,
          // only one copy of the world
          renderWorldCopies: false
        });
      }

      initMap().catch(console.error);
    </script>
  </body>
  </html>
"#;
