//! Inline HTML pages — thin glue, no templating engine

/// Landing page: new vs existing user
pub const HOME: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Trade Agent</title>
    <style>
        body { font-family: Arial, sans-serif; text-align: center; padding: 50px; }
        .btn { padding: 15px 30px; margin: 10px; font-size: 18px; cursor: pointer;
               background: #007bff; color: white; border: none; border-radius: 5px; }
    </style>
</head>
<body>
    <h1>Conversational Trade Agent</h1>
    <p>Welcome! Are you a new or existing user?</p>
    <button class="btn" onclick="location.href='/new_user'">New User</button>
    <button class="btn" onclick="location.href='/login'">Existing User</button>
</body>
</html>
"#;

/// Registration form: credentials, CSV upload, survey questions
pub const NEW_USER: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Register</title>
    <style>
        body { font-family: Arial, sans-serif; padding: 20px; max-width: 600px; margin: 0 auto; }
        .form-group { margin: 15px 0; }
        label { display: block; margin-bottom: 5px; font-weight: bold; }
        input, select, textarea { width: 100%; padding: 10px; border: 1px solid #ccc; border-radius: 5px; }
        .btn { padding: 12px 24px; background: #007bff; color: white; border: none;
               border-radius: 5px; cursor: pointer; font-size: 16px; }
        .btn:hover { background: #0056b3; }
    </style>
</head>
<body>
    <h2>New User Registration</h2>
    <form action="/register" method="post" enctype="multipart/form-data">
        <div class="form-group">
            <label>Username:</label>
            <input type="text" name="username" required>
        </div>

        <div class="form-group">
            <label>Password:</label>
            <input type="password" name="password" required>
        </div>

        <div class="form-group">
            <label>Upload Trade Data (CSV file):</label>
            <input type="file" name="trade_file" accept=".csv" required>
        </div>

        <div class="form-group">
            <label>Primary Trading Strategy:</label>
            <select name="primary_strategy">
                <option value="Technical">Technical</option>
                <option value="Momentum">Momentum</option>
                <option value="Value">Value</option>
                <option value="Sentiment">Sentiment</option>
            </select>
        </div>

        <div class="form-group">
            <label>How do you react to losses?</label>
            <textarea name="loss_reaction" rows="3" placeholder="Describe your typical response..."></textarea>
        </div>

        <div class="form-group">
            <label>Risk Tolerance:</label>
            <select name="risk_tolerance">
                <option value="Medium">Medium</option>
                <option value="High">High</option>
                <option value="Low">Low</option>
            </select>
        </div>

        <button type="submit" class="btn">Register</button>
    </form>
</body>
</html>
"#;

/// Login form
pub const LOGIN: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Login</title>
    <style>
        body { font-family: Arial, sans-serif; padding: 20px; max-width: 400px; margin: 0 auto; }
        .form-group { margin: 15px 0; }
        label { display: block; margin-bottom: 5px; font-weight: bold; }
        input { width: 100%; padding: 10px; border: 1px solid #ccc; border-radius: 5px; }
        .btn { padding: 12px 24px; background: #007bff; color: white; border: none;
               border-radius: 5px; cursor: pointer; font-size: 16px; }
    </style>
</head>
<body>
    <h2>Login</h2>
    <form action="/authenticate" method="post">
        <div class="form-group">
            <label>Username:</label>
            <input type="text" name="username" required>
        </div>
        <div class="form-group">
            <label>Password:</label>
            <input type="password" name="password" required>
        </div>
        <button type="submit" class="btn">Login</button>
    </form>
</body>
</html>
"#;

/// Post-registration confirmation with a link into the chat
pub fn register_success(trade_count: usize, trader_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Success</title>
    <style>
        body {{ font-family: Arial, sans-serif; padding: 20px; text-align: center; }}
        .success {{ background: #d4edda; padding: 20px; border-radius: 5px; margin: 20px 0; }}
        .btn {{ padding: 12px 24px; background: #007bff; color: white; text-decoration: none;
               border-radius: 5px; display: inline-block; margin: 10px; }}
    </style>
</head>
<body>
    <div class="success">
        <h2>Registration Successful!</h2>
        <p>Processed {trade_count} trades</p>
        <p>Trader ID: {trader_id}</p>
    </div>
    <a href="/chat/{trader_id}" class="btn">Start Chatting</a>
</body>
</html>
"#
    )
}

/// Post-login welcome with a link into the chat
pub fn welcome_back(username: &str, trader_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Welcome</title></head>
<body style="font-family: Arial, sans-serif; padding: 20px; text-align: center;">
    <h2>Welcome back, {username}!</h2>
    <a href="/chat/{trader_id}" style="padding: 12px 24px; background: #007bff;
       color: white; text-decoration: none; border-radius: 5px;">Continue to Chat</a>
</body>
</html>
"#
    )
}

/// Chat page: reads the streamed `data:` lines from the message endpoint
pub fn chat(trader_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Trade Agent Chat</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 0; padding: 20px; }}
        .container {{ max-width: 800px; margin: 0 auto; }}
        .chat-box {{ height: 400px; border: 2px solid #ccc; padding: 15px;
                    overflow-y: scroll; margin-bottom: 15px; border-radius: 10px;
                    background: #f9f9f9; }}
        .input-area {{ display: flex; gap: 10px; }}
        input {{ flex: 1; padding: 12px; border: 1px solid #ccc; border-radius: 5px; }}
        button {{ padding: 12px 20px; background: #007bff; color: white;
                 border: none; border-radius: 5px; cursor: pointer; }}
        .message {{ margin: 10px 0; padding: 12px; border-radius: 8px; }}
        .user {{ background: #007bff; color: white; text-align: right; }}
        .agent {{ background: #e9ecef; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>Chat with Your Trade Agent</h2>
        <div id="chatBox" class="chat-box"></div>
        <div class="input-area">
            <input type="text" id="messageInput" placeholder="Ask about my trading strategy, past trades, preferences..."
                   onkeypress="if(event.key==='Enter') sendMessage()">
            <button onclick="sendMessage()">Send</button>
        </div>
    </div>

    <script>
        let currentMessageDiv = null;

        function sendMessage() {{
            const input = document.getElementById('messageInput');
            const message = input.value.trim();
            if (!message) return;

            addMessage(message, 'user');
            input.value = '';
            currentMessageDiv = createAgentMessage();
            startStreaming(message);
        }}

        function createAgentMessage() {{
            const box = document.getElementById('chatBox');
            const div = document.createElement('div');
            div.className = 'message agent';
            div.innerHTML = '<strong>Agent:</strong> <span class="content"></span>';
            box.appendChild(div);
            box.scrollTop = box.scrollHeight;
            return div.querySelector('.content');
        }}

        function startStreaming(message) {{
            fetch('/chat/{trader_id}/message', {{
                method: 'POST',
                headers: {{'Content-Type': 'application/json'}},
                body: JSON.stringify({{'message': message}})
            }})
            .then(response => {{
                const reader = response.body.getReader();
                const decoder = new TextDecoder();

                function readStream() {{
                    return reader.read().then(function(result) {{
                        if (result.done) return;

                        const chunk = decoder.decode(result.value, {{stream: true}});
                        const lines = chunk.split('\n');

                        for (let line of lines) {{
                            if (line.startsWith('data: ')) {{
                                try {{
                                    const data = JSON.parse(line.slice(6));
                                    if (data.token) {{
                                        currentMessageDiv.textContent += data.token;
                                        document.getElementById('chatBox').scrollTop = document.getElementById('chatBox').scrollHeight;
                                    }}
                                    if (data.done) {{
                                        return;
                                    }}
                                }} catch (e) {{
                                    // Ignore parsing errors
                                }}
                            }}
                        }}

                        return readStream();
                    }});
                }}

                return readStream();
            }})
            .catch(error => {{
                if (currentMessageDiv) {{
                    currentMessageDiv.textContent = 'Error: ' + error.message;
                }}
            }});
        }}

        function addMessage(text, sender) {{
            const box = document.getElementById('chatBox');
            const div = document.createElement('div');
            div.className = `message ${{sender}}`;
            div.innerHTML = `<strong>${{sender === 'user' ? 'You' : 'Agent'}}:</strong> ${{text}}`;
            box.appendChild(div);
            box.scrollTop = box.scrollHeight;
        }}

        addMessage("Hello! I'm your trading agent. Ask me about my strategy, trades, or decisions!", 'agent');
    </script>
</body>
</html>
"#
    )
}
